//! Query profiling hooks.
//!
//! A profiler is a side-channel observer notified around every native
//! statement execution. It never alters control flow: the API is
//! infallible and connections notify it on success and failure alike.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Observer notified around native statement execution.
pub trait Profiler: Send + Sync {
    /// Called immediately before the native call.
    fn query_start(&self, sql: &str);

    /// Called immediately after the native call returns, regardless of
    /// outcome.
    fn query_finish(&self);
}

/// Shared handle connections hold onto.
pub type SharedProfiler = Arc<dyn Profiler>;

/// One profiled statement execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub sql: String,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct RecorderState {
    in_flight: Option<(String, Instant)>,
    entries: Vec<ProfileEntry>,
}

/// A profiler that records every execution with wall-clock timing.
#[derive(Debug, Default)]
pub struct RecordingProfiler {
    state: Mutex<RecorderState>,
}

impl RecordingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries so far, oldest first.
    pub fn entries(&self) -> Vec<ProfileEntry> {
        self.state.lock().map_or_else(|_| Vec::new(), |s| s.entries.clone())
    }

    /// Number of finished executions recorded.
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Profiler for RecordingProfiler {
    fn query_start(&self, sql: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.in_flight = Some((sql.to_string(), Instant::now()));
        }
    }

    fn query_finish(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some((sql, started)) = state.in_flight.take() {
                state.entries.push(ProfileEntry {
                    sql,
                    elapsed: started.elapsed(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_start_finish_pairs() {
        let profiler = RecordingProfiler::new();
        profiler.query_start("SELECT 1");
        profiler.query_finish();
        profiler.query_start("SELECT 2");
        profiler.query_finish();

        let entries = profiler.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sql, "SELECT 1");
        assert_eq!(entries[1].sql, "SELECT 2");
    }

    #[test]
    fn finish_without_start_is_harmless() {
        let profiler = RecordingProfiler::new();
        profiler.query_finish();
        assert!(profiler.is_empty());
    }
}
