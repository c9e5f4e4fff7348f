//! Wait configuration and its builder

use crate::classify::{Status, UnknownStatus};
use crate::error::ConfigError;
use crate::interval::IntervalStrategy;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

/// Immutable description of one wait: which statuses end it, how long it
/// may take and how often it polls and reports.
#[derive(Debug, Clone)]
pub struct WaitConfig<S> {
    target: HashSet<S>,
    transitional: HashSet<S>,
    failure: HashSet<S>,
    unknown: UnknownStatus,
    timeout: Duration,
    poll_interval: IntervalStrategy,
    progress_interval: Duration,
    initial_delay: Duration,
    target_occurrence: u32,
    not_found: Option<S>,
    not_found_checks: u32,
}

impl<S: Status> WaitConfig<S> {
    pub fn builder() -> WaitConfigBuilder<S> {
        WaitConfigBuilder::new()
    }

    pub fn target_statuses(&self) -> &HashSet<S> {
        &self.target
    }

    pub fn transitional_statuses(&self) -> &HashSet<S> {
        &self.transitional
    }

    pub fn failure_statuses(&self) -> &HashSet<S> {
        &self.failure
    }

    pub fn unknown_status(&self) -> UnknownStatus {
        self.unknown
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> &IntervalStrategy {
        &self.poll_interval
    }

    pub fn progress_interval(&self) -> Duration {
        self.progress_interval
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Number of consecutive target observations required to succeed
    pub fn target_occurrence(&self) -> u32 {
        self.target_occurrence
    }

    /// Status a fetcher reports for a resource that does not exist
    pub fn not_found_status(&self) -> Option<&S> {
        self.not_found.as_ref()
    }

    /// Consecutive not-found observations tolerated before the wait fails
    pub fn not_found_checks(&self) -> u32 {
        self.not_found_checks
    }

    pub(crate) fn is_not_found(&self, status: &S) -> bool {
        self.not_found.as_ref() == Some(status)
    }
}

#[derive(Debug, Clone)]
pub struct WaitConfigBuilder<S> {
    target: HashSet<S>,
    transitional: HashSet<S>,
    failure: HashSet<S>,
    unknown: Option<UnknownStatus>,
    timeout: Duration,
    poll_interval: IntervalStrategy,
    progress_interval: Duration,
    initial_delay: Duration,
    target_occurrence: u32,
    not_found: Option<S>,
    not_found_checks: u32,
}

impl<S: Status> WaitConfigBuilder<S> {
    pub fn new() -> Self {
        Self {
            target: HashSet::new(),
            transitional: HashSet::new(),
            failure: HashSet::new(),
            unknown: None,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: IntervalStrategy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            initial_delay: Duration::ZERO,
            target_occurrence: 1,
            not_found: None,
            not_found_checks: 0,
        }
    }

    pub fn target<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.target.extend(statuses);
        self
    }

    pub fn transitional<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.transitional.extend(statuses);
        self
    }

    pub fn failure<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.failure.extend(statuses);
        self
    }

    pub fn on_unknown(mut self, policy: UnknownStatus) -> Self {
        self.unknown = Some(policy);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, strategy: IntervalStrategy) -> Self {
        self.poll_interval = strategy;
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn consecutive_targets(mut self, count: u32) -> Self {
        self.target_occurrence = count;
        self
    }

    /// Declares the status meaning "resource missing". Unless it is a
    /// target, observing it fails the wait once more than
    /// [`not_found_checks`](Self::not_found_checks) observations in a row
    /// have been seen.
    pub fn not_found(mut self, status: S) -> Self {
        self.not_found = Some(status);
        self
    }

    /// Consecutive not-found observations to sit out, e.g. while a freshly
    /// created resource becomes visible. Ignored without a not-found status.
    pub fn not_found_checks(mut self, count: u32) -> Self {
        self.not_found_checks = count;
        self
    }

    pub fn build(self) -> Result<WaitConfig<S>, ConfigError> {
        if self.target.is_empty() {
            return Err(ConfigError::NoTargetStatus);
        }

        check_disjoint(&self.target, "target", &self.transitional, "transitional")?;
        check_disjoint(&self.target, "target", &self.failure, "failure")?;
        check_disjoint(&self.transitional, "transitional", &self.failure, "failure")?;

        if let Some(missing) = self.not_found.as_ref() {
            if self.transitional.contains(missing) {
                return Err(ConfigError::OverlappingStatus {
                    status: format!("{:?}", missing),
                    first: "not found",
                    second: "transitional",
                });
            }
        }

        let unknown = self.unknown.ok_or(ConfigError::UnknownPolicyUnset)?;

        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::ZeroProgressInterval);
        }
        if self.target_occurrence == 0 {
            return Err(ConfigError::ZeroTargetOccurrence);
        }
        self.poll_interval.validate()?;

        Ok(WaitConfig {
            target: self.target,
            transitional: self.transitional,
            failure: self.failure,
            unknown,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
            progress_interval: self.progress_interval,
            initial_delay: self.initial_delay,
            target_occurrence: self.target_occurrence,
            not_found: self.not_found,
            not_found_checks: self.not_found_checks,
        })
    }
}

impl<S: Status> Default for WaitConfigBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_disjoint<S: Status>(
    left: &HashSet<S>,
    left_name: &'static str,
    right: &HashSet<S>,
    right_name: &'static str,
) -> Result<(), ConfigError> {
    // Report the smallest offender so the message is stable across runs
    let mut shared: Vec<String> = left
        .intersection(right)
        .map(|status| format!("{:?}", status))
        .collect();
    shared.sort();

    match shared.into_iter().next() {
        Some(status) => Err(ConfigError::OverlappingStatus {
            status,
            first: left_name,
            second: right_name,
        }),
        None => Ok(()),
    }
}
