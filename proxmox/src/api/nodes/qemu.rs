//! QEMU/KVM virtual machine power operations

use crate::api::{client::Client, common::TaskId, error::ApiError};
use serde::{Deserialize, Serialize};

pub struct QemuApi<'a> {
    client: &'a Client,
    node: String,
}

impl<'a> QemuApi<'a> {
    pub fn new(client: &'a Client, node: &str) -> Self {
        Self {
            client,
            node: node.to_string(),
        }
    }

    /// DELETE /api2/json/nodes/{node}/qemu/{vmid}
    pub async fn delete(&self, vmid: u32, purge: bool) -> Result<TaskId, ApiError> {
        let path = if purge {
            format!("/api2/json/nodes/{}/qemu/{}?purge=1", self.node, vmid)
        } else {
            format!("/api2/json/nodes/{}/qemu/{}", self.node, vmid)
        };
        self.client.delete(&path).await
    }

    /// POST /api2/json/nodes/{node}/qemu/{vmid}/status/start
    pub async fn start(&self, vmid: u32) -> Result<TaskId, ApiError> {
        let path = format!("/api2/json/nodes/{}/qemu/{}/status/start", self.node, vmid);
        self.client.post(&path, &()).await
    }

    /// POST /api2/json/nodes/{node}/qemu/{vmid}/status/stop
    pub async fn stop(&self, vmid: u32) -> Result<TaskId, ApiError> {
        let path = format!("/api2/json/nodes/{}/qemu/{}/status/stop", self.node, vmid);
        self.client.post(&path, &()).await
    }

    /// GET /api2/json/nodes/{node}/qemu/{vmid}/status/current
    pub async fn get_status(&self, vmid: u32) -> Result<QemuStatus, ApiError> {
        let path = format!(
            "/api2/json/nodes/{}/qemu/{}/status/current",
            self.node, vmid
        );
        self.client.get(&path).await
    }
}

/// VM status information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QemuStatus {
    /// `running` or `stopped`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// QMP view of the guest, reports `paused` while status is still `running`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qmpstatus: Option<String>,
    /// Config lock held by a running operation, e.g. `backup` or `migrate`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
}

#[cfg(test)]
#[path = "./qemu_test.rs"]
mod qemu_test;
