//! converge - wait for remote resources to reach a target status
//!
//! One polling engine for every provider operation that has to wait for a
//! control plane to catch up: fetch the status, classify it, sleep, repeat
//! until a target status, a failure status, the deadline or cancellation.
//!
//! ```ignore
//! let config = WaitConfig::builder()
//!     .target(["InService"])
//!     .transitional(["Pending", "Pending:Wait"])
//!     .on_unknown(UnknownStatus::KeepPolling)
//!     .timeout(Duration::from_secs(600))
//!     .build()?;
//!
//! let instance = ConvergenceWaiter::new(config, fetcher)
//!     .with_progress(TracingProgress::new("instance i-0abc"))
//!     .wait()
//!     .await
//!     .into_result("instance i-0abc")?;
//! ```

// Core modules
pub mod classify;
pub mod config;
pub mod error;
pub mod interval;

// Collaborators of the waiter
pub mod context;
pub mod fetch;
pub mod progress;
pub mod retry;

// Engine and results
pub mod outcome;
pub mod waiter;

pub mod settings;

// Re-exports for convenience
pub use classify::{classify, Bucket, Status, UnknownStatus};
pub use config::{WaitConfig, WaitConfigBuilder};
pub use context::Context;
pub use error::{ConfigError, WaitError};
pub use fetch::{fetch_fn, FetchResult, Fetcher, FnFetcher};
pub use interval::IntervalStrategy;
pub use outcome::{FailureCause, WaitOutcome};
pub use progress::{Progress, ProgressSink, TracingProgress};
pub use retry::RetryFetcher;
pub use settings::{PollSettings, WaitSettings};
pub use waiter::{wait_for, ConvergenceWaiter, Outcome};
