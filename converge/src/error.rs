//! Error types for converge

use std::fmt::Debug;
use std::time::Duration;

/// Rejected wait configuration. Raised by the builder before any polling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one target status is required")]
    NoTargetStatus,

    #[error("status {status} is declared as both {first} and {second}")]
    OverlappingStatus {
        status: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("handling of unrecognised statuses must be chosen explicitly")]
    UnknownPolicyUnset,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("progress interval must be greater than zero")]
    ZeroProgressInterval,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("maximum poll interval {max:?} is below the base interval {base:?}")]
    InvertedBackoff { base: Duration, max: Duration },

    #[error("jitter fraction must be within [0, 1], got {0}")]
    InvalidJitter(f64),

    #[error("maximum poll interval {max:?} overflows once jitter is applied")]
    IntervalOverflow { max: Duration },

    #[error("consecutive target count must be at least 1")]
    ZeroTargetOccurrence,
}

/// A wait that did not end on its target, as an error for callers that
/// propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<S: Debug, E: std::error::Error + 'static> {
    #[error("{subject}: could not observe status after {attempts} attempt(s) over {elapsed:?}: {source}")]
    Observation {
        subject: String,
        last_status: Option<S>,
        attempts: u32,
        elapsed: Duration,
        #[source]
        source: E,
    },

    #[error("{subject} entered failure status {status:?} after {attempts} attempt(s) over {elapsed:?}{}", detail_suffix(.detail))]
    TerminalStatus {
        subject: String,
        status: S,
        detail: Option<String>,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("{subject} did not reach target state; last seen status {} after {attempts} attempt(s) over {elapsed:?}", last_seen(.last_status))]
    DeadlineExceeded {
        subject: String,
        last_status: Option<S>,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("wait for {subject} was cancelled; last seen status {} after {attempts} attempt(s) over {elapsed:?}", last_seen(.last_status))]
    Cancelled {
        subject: String,
        last_status: Option<S>,
        attempts: u32,
        elapsed: Duration,
    },
}

impl<S: Debug, E: std::error::Error + 'static> WaitError<S, E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::DeadlineExceeded { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            WaitError::Observation { attempts, .. }
            | WaitError::TerminalStatus { attempts, .. }
            | WaitError::DeadlineExceeded { attempts, .. }
            | WaitError::Cancelled { attempts, .. } => *attempts,
        }
    }
}

fn last_seen<S: Debug>(status: &Option<S>) -> String {
    match status {
        Some(status) => format!("{:?}", status),
        None => "(never observed)".to_string(),
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}
