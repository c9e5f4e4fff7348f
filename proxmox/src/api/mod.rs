//! Proxmox VE API client

pub mod client;
pub mod common;
pub mod error;
pub mod nodes;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, RetryConfig};
pub use common::TaskId;
pub use error::ApiError;
