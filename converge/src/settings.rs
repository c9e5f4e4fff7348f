//! Serializable timing settings
//!
//! `WaitSettings` is the on-disk / provider-config form of the timing
//! knobs of a wait. Status sets stay in code; only durations and policies
//! come from configuration.

use crate::classify::{Status, UnknownStatus};
use crate::config::{WaitConfigBuilder, DEFAULT_PROGRESS_INTERVAL, DEFAULT_TIMEOUT};
use crate::interval::IntervalStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub poll: PollSettings,
    #[serde(with = "duration_secs")]
    pub progress_interval: Duration,
    #[serde(with = "duration_secs")]
    pub initial_delay: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown: Option<UnknownStatus>,
    pub consecutive_targets: u32,
    /// Not-found observations tolerated in a row, for waits that declare a
    /// not-found status
    pub not_found_checks: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll: PollSettings::from(IntervalStrategy::default()),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            initial_delay: Duration::ZERO,
            unknown: None,
            consecutive_targets: 1,
            not_found_checks: 0,
        }
    }
}

impl WaitSettings {
    /// Copies every timing knob onto `builder`. The unknown-status policy
    /// is only set when the settings name one.
    pub fn apply<S: Status>(&self, builder: WaitConfigBuilder<S>) -> WaitConfigBuilder<S> {
        let builder = builder
            .timeout(self.timeout)
            .poll_interval(self.poll.clone().into())
            .progress_interval(self.progress_interval)
            .initial_delay(self.initial_delay)
            .consecutive_targets(self.consecutive_targets)
            .not_found_checks(self.not_found_checks);

        match self.unknown {
            Some(policy) => builder.on_unknown(policy),
            None => builder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PollSettings {
    Fixed {
        #[serde(with = "duration_secs")]
        interval: Duration,
    },
    Exponential {
        #[serde(with = "duration_secs")]
        base: Duration,
        #[serde(with = "duration_secs")]
        max: Duration,
        #[serde(default)]
        jitter: f64,
    },
}

impl From<PollSettings> for IntervalStrategy {
    fn from(settings: PollSettings) -> Self {
        match settings {
            PollSettings::Fixed { interval } => IntervalStrategy::Fixed(interval),
            PollSettings::Exponential { base, max, jitter } => {
                IntervalStrategy::BoundedExponential { base, max, jitter }
            }
        }
    }
}

impl From<IntervalStrategy> for PollSettings {
    fn from(strategy: IntervalStrategy) -> Self {
        match strategy {
            IntervalStrategy::Fixed(interval) => PollSettings::Fixed { interval },
            IntervalStrategy::BoundedExponential { base, max, jitter } => {
                PollSettings::Exponential { base, max, jitter }
            }
        }
    }
}

/// Durations as (possibly fractional) seconds, accepting integers or floats
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_f64(value.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Seconds {
            Whole(u64),
            Fractional(f64),
        }

        match Seconds::deserialize(deserializer)? {
            Seconds::Whole(secs) => Ok(Duration::from_secs(secs)),
            Seconds::Fractional(secs) => {
                Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
            }
        }
    }
}
