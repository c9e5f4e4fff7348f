#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Server;

    const UPID: &str = "UPID:node1:000C1F2A:0B3E4D5F:66A1B2C3:qmstart:100:root@pam:";

    #[test]
    fn test_qemu_api_new() {
        let client = create_test_client("https://test.example.com:8006");
        let api = QemuApi::new(&client, "node1");
        assert_eq!(api.node, "node1");
    }

    #[tokio::test]
    async fn test_get_status_running() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api2/json/nodes/node1/qemu/100/status/current")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "data": {
                    "status": "running",
                    "vmid": 100,
                    "name": "web-01",
                    "qmpstatus": "running",
                    "pid": 4242,
                    "uptime": 3600
                }
            }"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let status = api.get_status(100).await.unwrap();

        assert_eq!(status.status, "running");
        assert_eq!(status.vmid, Some(100));
        assert_eq!(status.name.as_deref(), Some("web-01"));
        assert_eq!(status.qmpstatus.as_deref(), Some("running"));
        assert!(status.lock.is_none());
    }

    #[tokio::test]
    async fn test_get_status_with_lock() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api2/json/nodes/node1/qemu/100/status/current")
            .with_status(200)
            .with_body(r#"{"data": {"status": "stopped", "lock": "backup"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let status = api.get_status(100).await.unwrap();

        assert_eq!(status.status, "stopped");
        assert_eq!(status.lock.as_deref(), Some("backup"));
    }

    #[tokio::test]
    async fn test_get_status_missing_vm() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api2/json/nodes/node1/qemu/999/status/current")
            .with_status(404)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let result = api.get_status(999).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_start_vm_returns_task() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api2/json/nodes/node1/qemu/100/status/start")
            .with_status(200)
            .with_body(format!(r#"{{"data": "{}"}}"#, UPID))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let task = api.start(100).await.unwrap();

        assert_eq!(task.as_str(), UPID);
        assert_eq!(task.task_type(), Some("qmstart"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_stop_vm_returns_task() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api2/json/nodes/node1/qemu/100/status/stop")
            .with_status(200)
            .with_body(r#"{"data": "UPID:node1:000C1F2B:0B3E4D60:66A1B2C4:qmstop:100:root@pam:"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let task = api.stop(100).await.unwrap();

        assert_eq!(task.task_type(), Some("qmstop"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_vm_with_purge() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/api2/json/nodes/node1/qemu/100?purge=1")
            .with_status(200)
            .with_body(
                r#"{"data": "UPID:node1:000C1F2C:0B3E4D61:66A1B2C5:qmdestroy:100:root@pam:"}"#,
            )
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let task = api.delete(100, true).await.unwrap();

        assert_eq!(task.task_type(), Some("qmdestroy"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_vm_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api2/json/nodes/node1/qemu/100/status/start")
            .with_status(500)
            .with_body(r#"{"errors": {"vmid": "VM is locked (backup)"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = QemuApi::new(&client, "node1");
        let result = api.start(100).await;

        assert!(matches!(result, Err(ApiError::ServiceUnavailable)));
    }
}
