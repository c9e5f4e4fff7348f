//! Waits behind provider operations
//!
//! Proxmox answers start, stop and destroy calls with a worker task id and
//! does the work in the background. These helpers poll the task or the VM
//! until the operation has visibly converged.

mod power;
mod task;

pub use power::{wait_for_power_state, wait_for_vm_removed, PowerState, VmPowerFetcher};
pub use task::{wait_for_task, TaskFetcher, TaskState};

use crate::api::ApiError;
use converge::{ConfigError, RetryFetcher, WaitError};
use std::fmt::Debug;
use thiserror::Error;

/// Retries of a single status fetch on rate limiting and outages. The
/// fetchers run on a client without transport retries so this is the only
/// retry layer.
pub const FETCH_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum WaiterError<S: Debug + 'static> {
    #[error("invalid wait settings: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wait(#[from] WaitError<S, ApiError>),
}

impl<S: Debug + 'static> WaiterError<S> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaiterError::Wait(err) if err.is_timeout())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaiterError::Wait(err) if err.is_cancelled())
    }
}

type Retrying<F> = RetryFetcher<F, fn(&ApiError) -> bool>;

fn retrying<F>(fetcher: F) -> Retrying<F>
where
    F: converge::Fetcher<Error = ApiError>,
{
    RetryFetcher::new(fetcher, FETCH_RETRIES, ApiError::is_retryable as fn(&ApiError) -> bool)
}
