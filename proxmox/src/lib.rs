//! Proxmox VE client with convergence waits for provider operations

pub mod api;
pub mod config;
pub mod waiters;

pub use config::{ProviderConfig, ProviderError, ProviderTimeouts};
pub use waiters::{
    wait_for_power_state, wait_for_task, wait_for_vm_removed, PowerState, TaskState, WaiterError,
};
