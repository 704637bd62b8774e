//! Error taxonomy for profiler control and statistics retrieval

use thiserror::Error;

/// Errors surfaced by the profiler lifecycle and statistics layers
#[derive(Error, Debug)]
pub enum ProfilerError {
    /// Statistics were requested before any completed profiling run.
    ///
    /// The message doubles as the instructional body of the HTTP 404
    /// response, so it must stay operator-readable.
    #[error("No stats available. Start and stop the profiler before trying to retrieve stats.")]
    NoData,

    /// Failure inside the underlying profiler engine. No recovery policy
    /// is defined for these; they map to an internal server error.
    #[error("Profiler backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, ProfilerError>;
