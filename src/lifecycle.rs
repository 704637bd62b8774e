//! Profiler lifecycle controller
//!
//! Thin state machine over a [`ProfilerBackend`] enforcing idempotent
//! start/stop semantics. Operators may issue redundant control calls
//! without coordination, so repeated starts and stops must never fail.
//!
//! The controller is a single injectable object shared by request
//! handlers via `Arc`, not a process-wide static. The state enum is
//! guarded by a mutex so concurrent in-flight requests cannot tear it;
//! this is a deliberate strengthening over the single-threaded contract
//! and changes no observable behavior.

use std::sync::Mutex;

use crate::backend::{FunctionRecord, ProfilerBackend};
use crate::error::Result;

/// Process-wide profiler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilerState {
    /// Never started, or cleared; no statistics exist
    Idle,
    /// Sampling active; statistics queries fail
    Running,
    /// Sampling data exists and is queryable until cleared or restarted
    Stopped,
}

/// Idempotent start/stop state machine wrapping the profiler engine
pub struct ProfilerController {
    backend: Box<dyn ProfilerBackend>,
    state: Mutex<ProfilerState>,
}

impl ProfilerController {
    pub fn new(backend: Box<dyn ProfilerBackend>) -> Self {
        ProfilerController {
            backend,
            state: Mutex::new(ProfilerState::Idle),
        }
    }

    /// Begin sampling. A no-op when already running.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if self.backend.is_running() {
            return Ok(());
        }
        self.backend.start()?;
        *state = ProfilerState::Running;
        Ok(())
    }

    /// Stop sampling unconditionally. Stopping twice is harmless.
    ///
    /// Lands in `Stopped` when the backend retained data, `Idle`
    /// otherwise.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.backend.stop()?;
        *state = if self.backend.raw_stats(true).is_some() {
            ProfilerState::Stopped
        } else {
            ProfilerState::Idle
        };
        Ok(())
    }

    /// Live running status straight from the backend, which is the
    /// source of truth, not the cached state enum.
    pub fn is_running(&self) -> bool {
        self.backend.is_running()
    }

    /// Discard retained statistics and return to `Idle`.
    pub fn clear_stats(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.backend.clear();
        *state = ProfilerState::Idle;
    }

    /// Current state of the lifecycle machine
    pub fn state(&self) -> ProfilerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Retained raw records, passed through from the backend
    pub fn raw_stats(&self, strip_dirs: bool) -> Option<Vec<FunctionRecord>> {
        self.backend.raw_stats(strip_dirs)
    }

    /// The wrapped backend, for read-only statistics queries
    pub fn backend(&self) -> &dyn ProfilerBackend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Backend double that counts engine calls
    #[derive(Default)]
    struct CountingBackend {
        running: AtomicBool,
        starts: AtomicUsize,
        stops: AtomicUsize,
        records: StdMutex<Option<Vec<FunctionRecord>>>,
    }

    impl ProfilerBackend for CountingBackend {
        fn start(&self) -> Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.running.swap(false, Ordering::SeqCst) {
                *self.records.lock().unwrap() = Some(vec![FunctionRecord {
                    path: "app.rs".to_string(),
                    line: 1,
                    func_name: "work".to_string(),
                    num_calls: 1,
                    total_time: 0.1,
                    cum_time: 0.1,
                }]);
            }
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn clear(&self) {
            *self.records.lock().unwrap() = None;
        }

        fn raw_stats(&self, _strip_dirs: bool) -> Option<Vec<FunctionRecord>> {
            self.records.lock().unwrap().clone()
        }
    }

    fn controller() -> (ProfilerController, std::sync::Arc<CountingBackend>) {
        let backend = std::sync::Arc::new(CountingBackend::default());
        let ctrl = ProfilerController::new(Box::new(backend.clone()));
        (ctrl, backend)
    }

    #[test]
    fn test_start_transitions_to_running() {
        let (ctrl, _) = controller();
        assert_eq!(ctrl.state(), ProfilerState::Idle);
        ctrl.start().unwrap();
        assert_eq!(ctrl.state(), ProfilerState::Running);
        assert!(ctrl.is_running());
    }

    #[test]
    fn test_start_is_idempotent() {
        let (ctrl, backend) = controller();
        ctrl.start().unwrap();
        ctrl.start().unwrap();
        ctrl.start().unwrap();
        assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
        assert!(ctrl.is_running());
    }

    #[test]
    fn test_stop_with_data_transitions_to_stopped() {
        let (ctrl, _) = controller();
        ctrl.start().unwrap();
        ctrl.stop().unwrap();
        assert_eq!(ctrl.state(), ProfilerState::Stopped);
        assert!(!ctrl.is_running());
    }

    #[test]
    fn test_stop_without_data_transitions_to_idle() {
        let (ctrl, _) = controller();
        ctrl.stop().unwrap();
        assert_eq!(ctrl.state(), ProfilerState::Idle);
    }

    #[test]
    fn test_stop_twice_is_harmless() {
        let (ctrl, backend) = controller();
        ctrl.start().unwrap();
        ctrl.stop().unwrap();
        ctrl.stop().unwrap();
        ctrl.stop().unwrap();
        assert_eq!(ctrl.state(), ProfilerState::Stopped);
        assert_eq!(backend.stops.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let (ctrl, _) = controller();
        ctrl.start().unwrap();
        ctrl.stop().unwrap();
        assert!(ctrl.raw_stats(true).is_some());
        ctrl.clear_stats();
        assert_eq!(ctrl.state(), ProfilerState::Idle);
        assert!(ctrl.raw_stats(true).is_none());
    }

    #[test]
    fn test_is_running_reflects_backend_not_cached_enum() {
        let (ctrl, backend) = controller();
        ctrl.start().unwrap();
        // Flip the backend behind the controller's back; the controller
        // must report the live answer.
        backend.running.store(false, Ordering::SeqCst);
        assert!(!ctrl.is_running());
    }
}
