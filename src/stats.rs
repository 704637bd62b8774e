//! Statistics transformer: raw function records to sorted report rows
//!
//! Converts the backend's raw per-function records into the JSON report
//! shape served over HTTP: derived per-call metrics with a zero-call
//! guard, descending sort by a caller-chosen key, and an optional row
//! limit.

use std::cmp::Ordering;

use serde::Serialize;

use crate::backend::ProfilerBackend;
use crate::error::{ProfilerError, Result};

/// Report key a statistics query can sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    NumCalls,
    CumTime,
    TotalTime,
    CumTimePerCall,
    TotalTimePerCall,
}

impl SortKey {
    /// All valid keys, in the order they are listed in error messages
    pub const ALL: [SortKey; 5] = [
        SortKey::NumCalls,
        SortKey::CumTime,
        SortKey::TotalTime,
        SortKey::CumTimePerCall,
        SortKey::TotalTimePerCall,
    ];

    /// Wire name of the key, matching the JSON report fields
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::NumCalls => "numCalls",
            SortKey::CumTime => "cumTime",
            SortKey::TotalTime => "totalTime",
            SortKey::CumTimePerCall => "cumTimePerCall",
            SortKey::TotalTimePerCall => "totalTimePerCall",
        }
    }

    /// Parse a wire name back into a key
    pub fn parse(name: &str) -> Option<SortKey> {
        SortKey::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// One row of the statistics report, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub path: String,
    pub line: u32,
    pub func_name: String,
    pub num_calls: u64,
    pub total_time: f64,
    pub total_time_per_call: f64,
    pub cum_time: f64,
    pub cum_time_per_call: f64,
}

impl ReportRow {
    /// Derive a row from a raw record, defining per-call metrics as 0 for
    /// functions that were never called (no division by zero).
    pub fn from_record(rec: crate::backend::FunctionRecord) -> Self {
        let (total_time_per_call, cum_time_per_call) = if rec.num_calls > 0 {
            let calls = rec.num_calls as f64;
            (rec.total_time / calls, rec.cum_time / calls)
        } else {
            (0.0, 0.0)
        };
        ReportRow {
            path: rec.path,
            line: rec.line,
            func_name: rec.func_name,
            num_calls: rec.num_calls,
            total_time: rec.total_time,
            total_time_per_call,
            cum_time: rec.cum_time,
            cum_time_per_call,
        }
    }

    /// Numeric value of the given sort key for this row
    fn sort_value(&self, key: SortKey) -> f64 {
        match key {
            SortKey::NumCalls => self.num_calls as f64,
            SortKey::CumTime => self.cum_time,
            SortKey::TotalTime => self.total_time,
            SortKey::CumTimePerCall => self.cum_time_per_call,
            SortKey::TotalTimePerCall => self.total_time_per_call,
        }
    }
}

/// Build a sorted, bounded statistics report from the backend's raw data
///
/// Rows are sorted descending by `sort`; ties may land in any order.
/// `limit` of `None` returns all rows. Read-only over backend state.
///
/// # Errors
///
/// Returns [`ProfilerError::NoData`] when the backend has no data to
/// convert (profiler never run, cleared, or still running). An empty
/// report from a completed run is not an error.
pub fn build_report(
    backend: &dyn ProfilerBackend,
    sort: SortKey,
    limit: Option<usize>,
    strip_dirs: bool,
) -> Result<Vec<ReportRow>> {
    let records = backend.raw_stats(strip_dirs).ok_or(ProfilerError::NoData)?;

    let mut rows: Vec<ReportRow> = records.into_iter().map(ReportRow::from_record).collect();
    rows.sort_by(|a, b| {
        b.sort_value(sort)
            .partial_cmp(&a.sort_value(sort))
            .unwrap_or(Ordering::Equal)
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    Ok(rows)
}
