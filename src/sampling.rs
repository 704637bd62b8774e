//! Signal-based sampling backend built on pprof
//!
//! One `ProfilerGuard` exists while sampling is active; stopping the
//! profiler resolves the guard's report into per-function records and
//! retains them until cleared or a new run starts. pprof samples stacks
//! rather than counting calls, so the records are sample-weighted:
//! `num_calls` is the number of samples a function appeared in,
//! `total_time` is leaf samples over the sampling frequency, and
//! `cum_time` is anywhere-on-stack samples over the frequency. A function
//! counts once per sample even under recursion, so `cum_time` never drops
//! below `total_time`.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use pprof::{ProfilerGuard, ProfilerGuardBuilder};
use tracing::{debug, info};

use crate::backend::{strip_dirs, FunctionRecord, ProfilerBackend};
use crate::error::{ProfilerError, Result};

/// Frames from system libraries and the unwinder itself are excluded so
/// the profiler does not profile its own stack collection.
const BLOCKLIST: &[&str] = &["libc", "libgcc", "pthread", "vdso", "backtrace"];

#[derive(Default)]
struct Inner {
    guard: Option<ProfilerGuard<'static>>,
    records: Option<Vec<FunctionRecord>>,
}

/// Sampling profiler engine with a process-wide lifecycle
pub struct SamplingBackend {
    frequency: i32,
    inner: Mutex<Inner>,
}

impl SamplingBackend {
    /// Create a backend sampling at `frequency` Hz. 99 Hz is the usual
    /// choice to avoid lock-step with other timers.
    pub fn new(frequency: i32) -> Self {
        SamplingBackend {
            frequency,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fold stack samples into per-function records.
    ///
    /// `data` maps a sampled stack to the number of times it was seen.
    fn aggregate(report: &pprof::Report, frequency: i32) -> Vec<FunctionRecord> {
        // Keyed by (path, line, name); frames from separate threads with
        // the same function fold together.
        let mut exclusive: HashMap<(String, u32, String), u64> = HashMap::new();
        let mut inclusive: HashMap<(String, u32, String), u64> = HashMap::new();

        for (frames, &count) in &report.data {
            let samples = count.max(0) as u64;
            if samples == 0 {
                continue;
            }

            // frames are leaf-first; the first symbol of the first frame
            // is where the samples were actually spent
            let mut seen: HashSet<(String, u32, String)> = HashSet::new();
            for frame in &frames.frames {
                for symbol in frame {
                    let key = (
                        symbol
                            .filename
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default(),
                        symbol.lineno.unwrap_or(0),
                        symbol.name(),
                    );
                    if seen.insert(key.clone()) {
                        *inclusive.entry(key).or_insert(0) += samples;
                    }
                }
            }

            if let Some(leaf) = frames.frames.first().and_then(|frame| frame.first()) {
                let key = (
                    leaf.filename
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    leaf.lineno.unwrap_or(0),
                    leaf.name(),
                );
                *exclusive.entry(key).or_insert(0) += samples;
            }
        }

        let period = 1.0 / frequency as f64;
        let mut records: Vec<FunctionRecord> = inclusive
            .into_iter()
            .map(|((path, line, func_name), stack_samples)| {
                let leaf_samples = exclusive
                    .get(&(path.clone(), line, func_name.clone()))
                    .copied()
                    .unwrap_or(0);
                FunctionRecord {
                    path,
                    line,
                    func_name,
                    num_calls: stack_samples,
                    total_time: leaf_samples as f64 * period,
                    cum_time: stack_samples as f64 * period,
                }
            })
            .collect();
        // Deterministic order for the raw view; the transformer re-sorts
        records.sort_by(|a, b| {
            (&a.path, a.line, &a.func_name).cmp(&(&b.path, b.line, &b.func_name))
        });
        records
    }
}

impl ProfilerBackend for SamplingBackend {
    fn start(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.guard.is_some() {
            return Ok(());
        }
        let guard = ProfilerGuardBuilder::default()
            .frequency(self.frequency)
            .blocklist(BLOCKLIST)
            .build()
            .map_err(|e| ProfilerError::Backend(e.to_string()))?;
        // A restart invalidates the previous run's data
        inner.records = None;
        inner.guard = Some(guard);
        info!(frequency = self.frequency, "sampling profiler started");
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut inner = self.lock();
        let Some(guard) = inner.guard.take() else {
            debug!("stop requested while profiler not running");
            return Ok(());
        };
        let report = guard
            .report()
            .build()
            .map_err(|e| ProfilerError::Backend(e.to_string()))?;
        drop(guard); // release the sampler before the (cheap) fold
        let records = Self::aggregate(&report, self.frequency);
        info!(functions = records.len(), "sampling profiler stopped");
        inner.records = Some(records);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.lock().guard.is_some()
    }

    fn clear(&self) {
        let mut inner = self.lock();
        inner.records = None;
        debug!("profiler statistics cleared");
    }

    fn raw_stats(&self, strip: bool) -> Option<Vec<FunctionRecord>> {
        let inner = self.lock();
        // While sampling is active the data is not queryable
        if inner.guard.is_some() {
            return None;
        }
        inner.records.clone().map(|records| {
            if strip {
                records
                    .into_iter()
                    .map(|mut rec| {
                        rec.path = strip_dirs(&rec.path);
                        rec
                    })
                    .collect()
            } else {
                records
            }
        })
    }
}
