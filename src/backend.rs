//! Profiler backend trait and the raw per-function record it produces
//!
//! The profiler engine has a global, process-wide lifecycle. Everything the
//! statistics layer needs from it fits in the capability set
//! `{start, stop, is_running, clear, raw_stats}`, so that is the whole
//! trait. Concrete engines (see [`crate::sampling`]) are selected at
//! construction time via [`crate::cli::BackendKind`].

use std::path::Path;

use crate::error::Result;

/// Raw per-function timing record produced by a profiler backend
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    /// Source file the function was recorded in
    pub path: String,
    /// Line number of the function
    pub line: u32,
    /// Function name
    pub func_name: String,
    /// Number of calls (or samples) attributed to the function
    pub num_calls: u64,
    /// Exclusive time in seconds, excluding callees
    pub total_time: f64,
    /// Inclusive time in seconds, including callees
    pub cum_time: f64,
}

/// Capability set of a sampling profiler engine
///
/// Implementations own their synchronization; all methods take `&self` and
/// must be callable from concurrent request handlers.
pub trait ProfilerBackend: Send + Sync {
    /// Begin sampling. Calling this while already running is a no-op.
    fn start(&self) -> Result<()>;

    /// Stop sampling and retain the collected data for querying.
    /// Stopping when not running is harmless.
    fn stop(&self) -> Result<()>;

    /// Live running status of the engine (never a cached view).
    fn is_running(&self) -> bool;

    /// Discard any retained data.
    fn clear(&self);

    /// Retained per-function records, or `None` when no data exists
    /// (never run, cleared, or currently running).
    ///
    /// `Some(vec![])` is a valid result: the profiler ran but sampled no
    /// functions. When `strip_dirs` is true, `path` is reduced to a bare
    /// filename.
    fn raw_stats(&self, strip_dirs: bool) -> Option<Vec<FunctionRecord>>;
}

impl<T: ProfilerBackend + ?Sized> ProfilerBackend for std::sync::Arc<T> {
    fn start(&self) -> Result<()> {
        (**self).start()
    }
    fn stop(&self) -> Result<()> {
        (**self).stop()
    }
    fn is_running(&self) -> bool {
        (**self).is_running()
    }
    fn clear(&self) {
        (**self).clear()
    }
    fn raw_stats(&self, strip_dirs: bool) -> Option<Vec<FunctionRecord>> {
        (**self).raw_stats(strip_dirs)
    }
}

/// Reduce a recorded source path to its base filename
///
/// Paths with no filename component (or synthetic frames like `<unknown>`)
/// are passed through unchanged.
pub fn strip_dirs(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_dirs_absolute_path() {
        assert_eq!(strip_dirs("/usr/src/app/handlers.rs"), "handlers.rs");
    }

    #[test]
    fn test_strip_dirs_relative_path() {
        assert_eq!(strip_dirs("src/stats.rs"), "stats.rs");
    }

    #[test]
    fn test_strip_dirs_bare_filename_unchanged() {
        assert_eq!(strip_dirs("stats.rs"), "stats.rs");
    }

    #[test]
    fn test_strip_dirs_empty_path() {
        assert_eq!(strip_dirs(""), "");
    }

    #[test]
    fn test_function_record_clone_and_eq() {
        let rec = FunctionRecord {
            path: "/srv/app/main.rs".to_string(),
            line: 42,
            func_name: "handle_request".to_string(),
            num_calls: 7,
            total_time: 0.25,
            cum_time: 0.5,
        };
        assert_eq!(rec.clone(), rec);
    }
}
