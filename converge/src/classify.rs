//! Status classification
//!
//! Maps an observed status onto the bucket that decides what the waiter
//! does next. Pure: the same status against the same config always lands
//! in the same bucket.

use crate::config::WaitConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Observed condition of a remote resource at one point in time.
///
/// The engine only compares statuses; strings and small enums both work.
pub trait Status: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Status for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Target,
    Transitional,
    Failure,
    /// Observed, but declared in none of the sets
    Unknown,
}

/// Policy for statuses that are in none of the declared sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatus {
    /// Treat like a transitional status and keep polling
    KeepPolling,
    /// Strict mode: an unrecognised status ends the wait as a failure
    Fail,
}

pub fn classify<S: Status>(status: &S, config: &WaitConfig<S>) -> Bucket {
    if config.target_statuses().contains(status) {
        Bucket::Target
    } else if config.failure_statuses().contains(status) {
        Bucket::Failure
    } else if config.transitional_statuses().contains(status) {
        Bucket::Transitional
    } else {
        Bucket::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WaitConfig<&'static str> {
        WaitConfig::builder()
            .target(["READY"])
            .transitional(["SCALING", "PENDING"])
            .failure(["ERROR"])
            .on_unknown(UnknownStatus::KeepPolling)
            .build()
            .unwrap()
    }

    #[test]
    fn classifies_each_declared_set() {
        let config = config();

        assert_eq!(classify(&"READY", &config), Bucket::Target);
        assert_eq!(classify(&"SCALING", &config), Bucket::Transitional);
        assert_eq!(classify(&"PENDING", &config), Bucket::Transitional);
        assert_eq!(classify(&"ERROR", &config), Bucket::Failure);
        assert_eq!(classify(&"DELETING", &config), Bucket::Unknown);
    }

    #[test]
    fn classification_is_repeatable() {
        let config = config();

        for status in ["READY", "SCALING", "ERROR", "whatever"] {
            let first = classify(&status, &config);
            for _ in 0..5 {
                assert_eq!(classify(&status, &config), first);
            }
        }
    }

    #[test]
    fn no_failure_set_means_nothing_is_fatal() {
        let config = WaitConfig::builder()
            .target(["READY"])
            .on_unknown(UnknownStatus::KeepPolling)
            .build()
            .unwrap();

        assert_eq!(classify(&"ERROR", &config), Bucket::Unknown);
    }

    #[test]
    fn enum_statuses_classify_like_strings() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum Attachment {
            Attaching,
            Attached,
            Failed,
        }

        let config = WaitConfig::builder()
            .target([Attachment::Attached])
            .transitional([Attachment::Attaching])
            .failure([Attachment::Failed])
            .on_unknown(UnknownStatus::Fail)
            .build()
            .unwrap();

        assert_eq!(classify(&Attachment::Attaching, &config), Bucket::Transitional);
        assert_eq!(classify(&Attachment::Attached, &config), Bucket::Target);
        assert_eq!(classify(&Attachment::Failed, &config), Bucket::Failure);
    }
}
