//! Integration tests for the pprof sampling backend
//!
//! pprof installs a process-wide signal handler, so anything that touches
//! a live guard runs serially.

use std::time::{Duration, Instant};

use serial_test::serial;

use sondeo::backend::ProfilerBackend;
use sondeo::sampling::SamplingBackend;

/// Burn CPU long enough for the sampler to observe something
fn busy_work(duration: Duration) -> u64 {
    let start = Instant::now();
    let mut acc = 0u64;
    while start.elapsed() < duration {
        for i in 0..10_000u64 {
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
    }
    acc
}

#[test]
#[serial]
fn test_start_stop_produces_queryable_stats() {
    let backend = SamplingBackend::new(99);
    assert!(!backend.is_running());

    backend.start().unwrap();
    assert!(backend.is_running());
    // Data is not queryable mid-run
    assert!(backend.raw_stats(true).is_none());

    busy_work(Duration::from_millis(300));

    backend.stop().unwrap();
    assert!(!backend.is_running());

    // A completed run always leaves data, even if nothing was sampled
    let records = backend.raw_stats(true).expect("stats after a run");
    for rec in &records {
        assert!(rec.cum_time >= rec.total_time);
        assert!(rec.total_time >= 0.0);
        // stripped paths carry no directory components
        assert!(!rec.path.contains('/'));
    }
}

#[test]
#[serial]
fn test_repeated_start_is_a_noop() {
    let backend = SamplingBackend::new(99);
    backend.start().unwrap();
    backend.start().unwrap();
    assert!(backend.is_running());
    backend.stop().unwrap();
    assert!(backend.raw_stats(true).is_some());
}

#[test]
#[serial]
fn test_restart_discards_previous_run() {
    let backend = SamplingBackend::new(99);
    backend.start().unwrap();
    busy_work(Duration::from_millis(100));
    backend.stop().unwrap();
    assert!(backend.raw_stats(true).is_some());

    backend.start().unwrap();
    // mid-run again: the old data is gone, not served
    assert!(backend.raw_stats(true).is_none());
    backend.stop().unwrap();
    assert!(backend.raw_stats(true).is_some());
}

#[test]
#[serial]
fn test_clear_discards_retained_data() {
    let backend = SamplingBackend::new(99);
    backend.start().unwrap();
    busy_work(Duration::from_millis(100));
    backend.stop().unwrap();

    backend.clear();
    assert!(backend.raw_stats(true).is_none());
}
