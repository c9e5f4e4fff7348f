//! The convergence waiter
//!
//! Drives one wait from start to a single terminal outcome:
//!
//! ```text
//! Polling --target--> Succeeded
//!         --failure/fetch error--> Failed
//!         --deadline--> TimedOut
//!         --cancel--> Cancelled
//! ```
//!
//! Each iteration checks the deadline, fetches, classifies, optionally
//! reports progress and then sleeps per the interval strategy. Sleeps are
//! capped at the remaining budget, and both the fetch and the sleep are
//! raced against the deadline and the context's cancellation.

use crate::classify::{classify, Bucket, UnknownStatus};
use crate::config::WaitConfig;
use crate::context::{deadline_after, Context};
use crate::fetch::Fetcher;
use crate::outcome::{FailureCause, WaitOutcome};
use crate::progress::{Progress, ProgressGate, ProgressSink};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::Duration;
use tokio::time::{self, Instant};

pub type Outcome<F> =
    WaitOutcome<<F as Fetcher>::Status, <F as Fetcher>::Payload, <F as Fetcher>::Error>;

pub struct ConvergenceWaiter<'a, F: Fetcher> {
    config: WaitConfig<F::Status>,
    fetcher: F,
    context: Context,
    progress: Option<Box<dyn ProgressSink<F::Status, F::Payload> + 'a>>,
    rng: Box<dyn RngCore + Send + Sync + 'a>,
}

/// Why a fetch or a sleep was cut short
enum Interrupt {
    Deadline,
    Cancelled,
}

impl<'a, F: Fetcher> ConvergenceWaiter<'a, F> {
    pub fn new(config: WaitConfig<F::Status>, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            context: Context::new(),
            progress: None,
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_progress<P>(mut self, sink: P) -> Self
    where
        P: ProgressSink<F::Status, F::Payload> + 'a,
    {
        self.progress = Some(Box::new(sink));
        self
    }

    /// Random source for interval jitter; seed it to make waits reproducible
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + Sync + 'a,
    {
        self.rng = Box::new(rng);
        self
    }

    pub async fn wait(mut self) -> Outcome<F> {
        let started = Instant::now();
        let mut deadline = deadline_after(started, self.config.timeout());
        if let Some(context_deadline) = self.context.deadline() {
            deadline = deadline.min(context_deadline);
        }

        let mut gate = ProgressGate::new(self.config.progress_interval(), started);
        let mut attempts = 0u32;
        let mut streak = 0u32;
        let mut missing = 0u32;
        let mut last_status = None;

        let initial_delay = self.config.initial_delay();
        if !initial_delay.is_zero() {
            tracing::debug!("Delaying first status fetch by {:?}", initial_delay);
            if let Err(interrupt) = self.pause(initial_delay, deadline).await {
                return self.interrupted(interrupt, last_status, attempts, started);
            }
        }

        loop {
            if Instant::now() >= deadline {
                return self.interrupted(Interrupt::Deadline, last_status, attempts, started);
            }
            if self.context.is_cancelled() {
                return self.interrupted(Interrupt::Cancelled, last_status, attempts, started);
            }

            let fetched = tokio::select! {
                biased;
                _ = self.context.cancelled() => Err(Interrupt::Cancelled),
                _ = time::sleep_until(deadline) => Err(Interrupt::Deadline),
                result = self.fetcher.fetch() => Ok(result),
            };

            let observed = match fetched {
                Ok(Ok(observed)) => observed,
                Ok(Err(error)) => {
                    attempts += 1;
                    tracing::error!(
                        "Status fetch failed on attempt {}: {}",
                        attempts,
                        error
                    );
                    return WaitOutcome::Failed {
                        cause: FailureCause::Observation { error, last_status },
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }
                Err(interrupt) => {
                    return self.interrupted(interrupt, last_status, attempts, started);
                }
            };

            attempts += 1;
            let mut bucket = classify(&observed.status, &self.config);
            if !matches!(bucket, Bucket::Target) && self.config.is_not_found(&observed.status) {
                missing += 1;
                bucket = if missing > self.config.not_found_checks() {
                    Bucket::Failure
                } else {
                    tracing::debug!(
                        "Resource not found ({} of {} tolerated)",
                        missing,
                        self.config.not_found_checks()
                    );
                    Bucket::Transitional
                };
            } else {
                missing = 0;
            }
            tracing::debug!(
                "Attempt {}: status {:?} is {:?}",
                attempts,
                observed.status,
                bucket
            );

            match bucket {
                Bucket::Target => {
                    streak += 1;
                    if streak >= self.config.target_occurrence() {
                        let elapsed = started.elapsed();
                        tracing::info!(
                            "Reached status {:?} after {} attempt(s) in {:?}",
                            observed.status,
                            attempts,
                            elapsed
                        );
                        return WaitOutcome::Succeeded {
                            status: observed.status,
                            payload: observed.payload,
                            attempts,
                            elapsed,
                        };
                    }
                }
                Bucket::Failure => {
                    tracing::error!(
                        "Observed failure status {:?} after {} attempt(s)",
                        observed.status,
                        attempts
                    );
                    return WaitOutcome::Failed {
                        cause: FailureCause::TerminalStatus {
                            status: observed.status,
                            payload: observed.payload,
                        },
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }
                Bucket::Unknown if self.config.unknown_status() == UnknownStatus::Fail => {
                    tracing::error!(
                        "Observed unrecognised status {:?} after {} attempt(s)",
                        observed.status,
                        attempts
                    );
                    return WaitOutcome::Failed {
                        cause: FailureCause::UnrecognizedStatus {
                            status: observed.status,
                            payload: observed.payload,
                        },
                        attempts,
                        elapsed: started.elapsed(),
                    };
                }
                Bucket::Transitional | Bucket::Unknown => streak = 0,
            }

            let now = Instant::now();
            if gate.ready(now) {
                if let Some(sink) = &self.progress {
                    sink.on_progress(
                        &observed,
                        Progress {
                            attempt: attempts,
                            elapsed: now.duration_since(started),
                        },
                    );
                }
            }
            last_status = Some(observed.status);

            let delay = self.config.poll_interval().next(attempts, &mut *self.rng);
            if let Err(interrupt) = self.pause(delay, deadline).await {
                return self.interrupted(interrupt, last_status, attempts, started);
            }
        }
    }

    /// Sleeps for `delay`, never past `deadline`. Only cancellation
    /// interrupts; reaching the deadline is left to the loop's own check.
    async fn pause(&self, delay: Duration, deadline: Instant) -> Result<(), Interrupt> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let delay = delay.min(remaining);

        tokio::select! {
            biased;
            _ = self.context.cancelled() => Err(Interrupt::Cancelled),
            _ = time::sleep(delay) => Ok(()),
        }
    }

    fn interrupted(
        &self,
        interrupt: Interrupt,
        last_status: Option<F::Status>,
        attempts: u32,
        started: Instant,
    ) -> Outcome<F> {
        let elapsed = started.elapsed();

        // A context that cancelled itself on its own deadline is a timeout
        let timed_out = match interrupt {
            Interrupt::Deadline => true,
            Interrupt::Cancelled => self.context.is_expired(),
        };

        if timed_out {
            tracing::warn!(
                "Timed out after {:?} and {} attempt(s); last status {:?}",
                elapsed,
                attempts,
                last_status
            );
            WaitOutcome::TimedOut {
                last_status,
                attempts,
                elapsed,
            }
        } else {
            tracing::warn!(
                "Wait cancelled after {:?} and {} attempt(s); last status {:?}",
                elapsed,
                attempts,
                last_status
            );
            WaitOutcome::Cancelled {
                last_status,
                attempts,
                elapsed,
            }
        }
    }
}

/// Waits with no progress sink and a fresh context
pub async fn wait_for<F: Fetcher>(config: WaitConfig<F::Status>, fetcher: F) -> Outcome<F> {
    ConvergenceWaiter::new(config, fetcher).wait().await
}
