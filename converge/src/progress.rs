//! Progress reporting for long waits

use crate::fetch::FetchResult;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

/// Where a still-running wait stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub attempt: u32,
    pub elapsed: Duration,
}

/// Observer of a wait that has not finished yet.
///
/// Called at most once per progress interval, never on every poll.
pub trait ProgressSink<S, T>: Send + Sync {
    fn on_progress(&self, observed: &FetchResult<S, T>, progress: Progress);
}

impl<S, T, F> ProgressSink<S, T> for F
where
    F: Fn(&FetchResult<S, T>, Progress) + Send + Sync,
{
    fn on_progress(&self, observed: &FetchResult<S, T>, progress: Progress) {
        self(observed, progress)
    }
}

/// Logs each progress report at info level
#[derive(Debug, Clone)]
pub struct TracingProgress {
    subject: String,
}

impl TracingProgress {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

impl<S: Debug, T> ProgressSink<S, T> for TracingProgress {
    fn on_progress(&self, observed: &FetchResult<S, T>, progress: Progress) {
        tracing::info!(
            "Still waiting for {}: status {:?} after {} attempt(s) ({:?} elapsed)",
            self.subject,
            observed.status,
            progress.attempt,
            progress.elapsed
        );
    }
}

/// Rate limiter deciding when the sink may be called again
#[derive(Debug)]
pub(crate) struct ProgressGate {
    interval: Duration,
    last: Instant,
}

impl ProgressGate {
    pub(crate) fn new(interval: Duration, started: Instant) -> Self {
        Self {
            interval,
            last: started,
        }
    }

    pub(crate) fn ready(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn gate_opens_once_per_interval() {
        let start = Instant::now();
        let mut gate = ProgressGate::new(Duration::from_secs(30), start);

        assert!(!gate.ready(start));
        assert!(!gate.ready(start + Duration::from_secs(29)));
        assert!(gate.ready(start + Duration::from_secs(30)));
        assert!(!gate.ready(start + Duration::from_secs(35)));
        assert!(!gate.ready(start + Duration::from_secs(59)));
        assert!(gate.ready(start + Duration::from_secs(61)));
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |observed: &FetchResult<&'static str, ()>, progress: Progress| {
            seen.lock().unwrap().push((observed.status, progress.attempt));
        };

        sink.on_progress(
            &FetchResult::status_only("SCALING"),
            Progress {
                attempt: 4,
                elapsed: Duration::from_secs(31),
            },
        );

        assert_eq!(*seen.lock().unwrap(), vec![("SCALING", 4)]);
    }

    #[test]
    fn tracing_sink_accepts_any_debug_status() {
        let sink = TracingProgress::new("volume attachment");
        sink.on_progress(
            &FetchResult::new(42_u8, "payload"),
            Progress {
                attempt: 1,
                elapsed: Duration::ZERO,
            },
        );
    }
}
