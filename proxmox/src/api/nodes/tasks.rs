//! Worker task status

use crate::api::{client::Client, common::TaskId, error::ApiError};
use serde::{Deserialize, Serialize};

pub struct TasksApi<'a> {
    client: &'a Client,
    node: String,
}

impl<'a> TasksApi<'a> {
    pub fn new(client: &'a Client, node: &str) -> Self {
        Self {
            client,
            node: node.to_string(),
        }
    }

    /// GET /api2/json/nodes/{node}/tasks/{upid}/status
    pub async fn status(&self, upid: &TaskId) -> Result<TaskStatus, ApiError> {
        let path = format!(
            "/api2/json/nodes/{}/tasks/{}/status",
            self.node,
            urlencoding::encode(upid.as_str())
        );
        self.client.get(&path).await
    }
}

/// Status of a worker task
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskStatus {
    /// `running` until the worker exits, then `stopped`
    pub status: String,
    /// Set once stopped: `OK`, `WARNINGS: <n>` or the error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exitstatus: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starttime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upid: Option<TaskId>,
}

impl TaskStatus {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    const UPID: &str = "UPID:node1:000C1F2A:0B3E4D5F:66A1B2C3:qmstart:100:root@pam:";

    fn status_path() -> String {
        format!(
            "/api2/json/nodes/node1/tasks/{}/status",
            urlencoding::encode(UPID)
        )
    }

    #[tokio::test]
    async fn running_task() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", status_path().as_str())
            .with_status(200)
            .with_body(
                r#"{"data": {"status": "running", "type": "qmstart", "id": "100",
                    "node": "node1", "user": "root@pam", "starttime": 1721872067}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let status = client
            .nodes()
            .node("node1")
            .tasks()
            .status(&TaskId::new(UPID))
            .await
            .unwrap();

        assert!(status.is_running());
        assert_eq!(status.type_.as_deref(), Some("qmstart"));
        assert!(status.exitstatus.is_none());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn stopped_task_carries_exit_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", status_path().as_str())
            .with_status(200)
            .with_body(
                r#"{"data": {"status": "stopped", "exitstatus": "start failed: QEMU exited with code 1"}}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let status = client
            .nodes()
            .node("node1")
            .tasks()
            .status(&TaskId::new(UPID))
            .await
            .unwrap();

        assert!(!status.is_running());
        assert_eq!(
            status.exitstatus.as_deref(),
            Some("start failed: QEMU exited with code 1")
        );
    }

    #[test]
    fn upid_is_encoded_in_path() {
        let encoded = urlencoding::encode(UPID);
        assert!(!encoded.contains(':'));
        assert!(!encoded.contains('@'));
    }
}
