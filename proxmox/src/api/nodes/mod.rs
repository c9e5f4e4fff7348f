//! Nodes API module for accessing node-specific resources

use crate::api::client::Client;

mod qemu;
mod tasks;
pub use qemu::{QemuApi, QemuStatus};
pub use tasks::{TaskStatus, TasksApi};

pub struct NodesApi<'a> {
    client: &'a Client,
}

impl<'a> NodesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn node(&self, node: &str) -> NodeApi<'a> {
        NodeApi {
            client: self.client,
            node: node.to_string(),
        }
    }
}

pub struct NodeApi<'a> {
    client: &'a Client,
    node: String,
}

impl<'a> NodeApi<'a> {
    pub fn qemu(&self) -> QemuApi<'a> {
        QemuApi::new(self.client, &self.node)
    }

    pub fn tasks(&self) -> TasksApi<'a> {
        TasksApi::new(self.client, &self.node)
    }
}
