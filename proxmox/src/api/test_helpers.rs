//! Test helpers for the Proxmox API

use super::{Client, RetryConfig};

/// Client against a mock server with transport retries disabled, so
/// mock expectations count exactly one request per call
pub fn create_test_client(url: &str) -> Client {
    Client::with_config(url, "test@pam!test=secret", true, RetryConfig::no_retries()).unwrap()
}
