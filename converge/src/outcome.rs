//! Terminal results of a wait

use crate::classify::Status;
use crate::error::WaitError;
use std::time::Duration;

/// Why a wait failed before its deadline
#[derive(Debug)]
pub enum FailureCause<S, T, E> {
    /// The fetcher could not retrieve the status
    Observation { error: E, last_status: Option<S> },
    /// A declared failure status was observed
    TerminalStatus { status: S, payload: T },
    /// A status in none of the declared sets, under the strict policy
    UnrecognizedStatus { status: S, payload: T },
}

/// Exactly one of these is produced per wait
#[derive(Debug)]
pub enum WaitOutcome<S, T, E> {
    Succeeded {
        status: S,
        payload: T,
        attempts: u32,
        elapsed: Duration,
    },
    Failed {
        cause: FailureCause<S, T, E>,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        last_status: Option<S>,
        attempts: u32,
        elapsed: Duration,
    },
    Cancelled {
        last_status: Option<S>,
        attempts: u32,
        elapsed: Duration,
    },
}

impl<S, T, E> WaitOutcome<S, T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Succeeded { attempts, .. }
            | WaitOutcome::Failed { attempts, .. }
            | WaitOutcome::TimedOut { attempts, .. }
            | WaitOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            WaitOutcome::Succeeded { elapsed, .. }
            | WaitOutcome::Failed { elapsed, .. }
            | WaitOutcome::TimedOut { elapsed, .. }
            | WaitOutcome::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    /// Most recent status the wait saw, if any fetch succeeded
    pub fn last_status(&self) -> Option<&S> {
        match self {
            WaitOutcome::Succeeded { status, .. } => Some(status),
            WaitOutcome::Failed { cause, .. } => match cause {
                FailureCause::Observation { last_status, .. } => last_status.as_ref(),
                FailureCause::TerminalStatus { status, .. }
                | FailureCause::UnrecognizedStatus { status, .. } => Some(status),
            },
            WaitOutcome::TimedOut { last_status, .. }
            | WaitOutcome::Cancelled { last_status, .. } => last_status.as_ref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Succeeded { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitOutcome::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled { .. })
    }

    pub fn payload(self) -> Option<T> {
        match self {
            WaitOutcome::Succeeded { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

impl<S, T, E> WaitOutcome<S, T, E>
where
    S: Status,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Converts a non-success outcome into a [`WaitError`] naming `subject`
    pub fn into_result(self, subject: impl Into<String>) -> Result<T, WaitError<S, E>> {
        self.into_result_with(subject, |_| None)
    }

    /// Like [`into_result`](Self::into_result); `detail` extracts a remote
    /// error message from the payload of a failure status.
    pub fn into_result_with<D>(
        self,
        subject: impl Into<String>,
        detail: D,
    ) -> Result<T, WaitError<S, E>>
    where
        D: FnOnce(&T) -> Option<String>,
    {
        let subject = subject.into();

        match self {
            WaitOutcome::Succeeded { payload, .. } => Ok(payload),
            WaitOutcome::Failed {
                cause,
                attempts,
                elapsed,
            } => Err(match cause {
                FailureCause::Observation { error, last_status } => WaitError::Observation {
                    subject,
                    last_status,
                    attempts,
                    elapsed,
                    source: error,
                },
                FailureCause::TerminalStatus { status, payload } => WaitError::TerminalStatus {
                    subject,
                    status,
                    detail: detail(&payload),
                    attempts,
                    elapsed,
                },
                FailureCause::UnrecognizedStatus { status, payload } => {
                    WaitError::TerminalStatus {
                        subject,
                        status,
                        detail: detail(&payload)
                            .or_else(|| Some("status is not recognised".to_string())),
                        attempts,
                        elapsed,
                    }
                }
            }),
            WaitOutcome::TimedOut {
                last_status,
                attempts,
                elapsed,
            } => Err(WaitError::DeadlineExceeded {
                subject,
                last_status,
                attempts,
                elapsed,
            }),
            WaitOutcome::Cancelled {
                last_status,
                attempts,
                elapsed,
            } => Err(WaitError::Cancelled {
                subject,
                last_status,
                attempts,
                elapsed,
            }),
        }
    }
}
