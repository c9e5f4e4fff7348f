//! Provider configuration
//!
//! Connection settings come from the provider block first and fall back to
//! `PROXMOX_ENDPOINT`, `PROXMOX_API_TOKEN` and `PROXMOX_INSECURE`. Wait
//! timeouts per operation kind can be overridden with
//! `PROXMOX_TASK_TIMEOUT`, `PROXMOX_POWER_TIMEOUT` and
//! `PROXMOX_DELETE_TIMEOUT`, in seconds.

use crate::api::{ApiError, Client};
use converge::{IntervalStrategy, WaitSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ENDPOINT_ENV: &str = "PROXMOX_ENDPOINT";
pub const API_TOKEN_ENV: &str = "PROXMOX_API_TOKEN";
pub const INSECURE_ENV: &str = "PROXMOX_INSECURE";
pub const TASK_TIMEOUT_ENV: &str = "PROXMOX_TASK_TIMEOUT";
pub const POWER_TIMEOUT_ENV: &str = "PROXMOX_POWER_TIMEOUT";
pub const DELETE_TIMEOUT_ENV: &str = "PROXMOX_DELETE_TIMEOUT";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("endpoint is required (set in provider config or PROXMOX_ENDPOINT env var)")]
    MissingEndpoint,

    #[error("api_token is required (set in provider config or PROXMOX_API_TOKEN env var)")]
    MissingApiToken,

    #[error("{var} must be a whole number of seconds greater than zero, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },

    #[error("invalid provider configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to create API client: {0}")]
    Client(#[from] ApiError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(default)]
    pub timeouts: ProviderTimeouts,
}

/// Timing of the waits behind each kind of provider operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderTimeouts {
    /// Worker tasks started by create, update and power operations
    pub task: WaitSettings,
    /// VM power state changes observed through `status/current`
    pub power: WaitSettings,
    /// VM removal after a destroy task
    pub delete: WaitSettings,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        let fast = converge::PollSettings::from(
            IntervalStrategy::exponential(Duration::from_millis(500), Duration::from_secs(5))
                .with_jitter(0.1),
        );

        Self {
            task: WaitSettings {
                poll: fast.clone(),
                ..WaitSettings::default()
            },
            power: WaitSettings {
                timeout: Duration::from_secs(5 * 60),
                poll: fast,
                not_found_checks: 5,
                ..WaitSettings::default()
            },
            delete: WaitSettings {
                timeout: Duration::from_secs(10 * 60),
                ..WaitSettings::default()
            },
        }
    }
}

impl ProviderTimeouts {
    /// Overrides timeouts named in the environment
    pub fn apply_env(&mut self) -> Result<(), ProviderError> {
        for (var, settings) in [
            (TASK_TIMEOUT_ENV, &mut self.task),
            (POWER_TIMEOUT_ENV, &mut self.power),
            (DELETE_TIMEOUT_ENV, &mut self.delete),
        ] {
            if let Some(timeout) = timeout_from_env(var)? {
                settings.timeout = timeout;
            }
        }
        Ok(())
    }
}

impl ProviderConfig {
    /// Configuration from the environment alone
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::default().with_env()
    }

    /// Provider block as JSON, completed from the environment
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        let config: ProviderConfig = serde_json::from_str(json)?;
        config.with_env()
    }

    fn with_env(mut self) -> Result<Self, ProviderError> {
        self.endpoint = self.endpoint.or_else(|| std::env::var(ENDPOINT_ENV).ok());
        self.api_token = self.api_token.or_else(|| std::env::var(API_TOKEN_ENV).ok());
        self.insecure = self.insecure.or_else(|| {
            std::env::var(INSECURE_ENV)
                .ok()
                .and_then(|v| v.parse::<bool>().ok())
        });
        self.timeouts.apply_env()?;
        Ok(self)
    }

    pub fn client(&self) -> Result<Client, ProviderError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(ProviderError::MissingEndpoint)?;
        let api_token = self
            .api_token
            .as_deref()
            .ok_or(ProviderError::MissingApiToken)?;

        Ok(Client::new(
            endpoint,
            api_token,
            self.insecure.unwrap_or(false),
        )?)
    }
}

fn timeout_from_env(var: &'static str) -> Result<Option<Duration>, ProviderError> {
    let Ok(value) = std::env::var(var) else {
        return Ok(None);
    };

    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(ProviderError::InvalidTimeout { var, value }),
    }
}
