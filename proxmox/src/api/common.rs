//! Common types and utilities for Proxmox API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a worker task (UPID), e.g.
/// `UPID:pve1:0002A1B3:0A1B2C3D:65F1A2B3:qmstart:100:root@pam:`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(upid: impl Into<String>) -> Self {
        Self(upid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Node the task runs on, taken from the second UPID field
    pub fn node(&self) -> Option<&str> {
        let mut fields = self.0.split(':');
        match (fields.next(), fields.next()) {
            (Some("UPID"), Some(node)) if !node.is_empty() => Some(node),
            _ => None,
        }
    }

    /// Task type such as `qmstart` or `qmdestroy`
    pub fn task_type(&self) -> Option<&str> {
        let fields: Vec<&str> = self.0.split(':').collect();
        if fields.first() != Some(&"UPID") {
            return None;
        }
        fields.get(5).copied().filter(|t| !t.is_empty())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub errors: Option<HashMap<String, String>>,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: message={message:?}, field_errors={field_errors:?}")]
pub struct ApiErrorDetails {
    pub message: Option<String>,
    pub field_errors: Option<HashMap<String, String>>,
}
