//! Sondeo - runtime CPU profiling control over HTTP
//!
//! This library lets an operator start and stop a sampling CPU profiler
//! inside a running process and retrieve aggregated function-level timing
//! statistics as JSON, all over a small REST surface. The profiler engine
//! sits behind the [`backend::ProfilerBackend`] trait so alternate engines
//! can be selected at construction time.

pub mod backend;
pub mod cli;
pub mod error;
pub mod lifecycle;
pub mod sampling;
pub mod server;
pub mod stats;
