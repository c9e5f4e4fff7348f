use super::{retrying, WaiterError};
use crate::api::nodes::TaskStatus;
use crate::api::{ApiError, Client, TaskId};
use async_trait::async_trait;
use converge::{
    Context, ConvergenceWaiter, FetchResult, Fetcher, TracingProgress, UnknownStatus, WaitConfig,
    WaitSettings,
};

/// Where a worker task stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Running,
    Succeeded,
    /// Finished, but logged warnings (`WARNINGS: <n>`)
    Warnings,
    Failed,
}

impl TaskState {
    pub fn of(status: &TaskStatus) -> Self {
        if status.is_running() {
            return TaskState::Running;
        }

        match status.exitstatus.as_deref() {
            Some("OK") => TaskState::Succeeded,
            Some(exit) if exit.starts_with("WARNINGS") => TaskState::Warnings,
            _ => TaskState::Failed,
        }
    }
}

/// Reads the status of one worker task
pub struct TaskFetcher {
    client: Client,
    node: String,
    upid: TaskId,
}

impl TaskFetcher {
    pub fn new(client: Client, node: &str, upid: TaskId) -> Self {
        Self {
            client,
            node: node.to_string(),
            upid,
        }
    }
}

#[async_trait]
impl Fetcher for TaskFetcher {
    type Status = TaskState;
    type Payload = TaskStatus;
    type Error = ApiError;

    async fn fetch(&self) -> Result<FetchResult<TaskState, TaskStatus>, ApiError> {
        let status = self
            .client
            .nodes()
            .node(&self.node)
            .tasks()
            .status(&self.upid)
            .await?;

        Ok(FetchResult::new(TaskState::of(&status), status))
    }
}

/// Waits until the task has stopped. A task that stopped with an error is
/// reported with its exit status.
pub async fn wait_for_task(
    client: &Client,
    node: &str,
    upid: &TaskId,
    settings: &WaitSettings,
    context: &Context,
) -> Result<TaskStatus, WaiterError<TaskState>> {
    let config = settings
        .apply(
            WaitConfig::builder()
                .target([TaskState::Succeeded, TaskState::Warnings])
                .transitional([TaskState::Running])
                .failure([TaskState::Failed])
                .on_unknown(UnknownStatus::Fail),
        )
        .build()?;

    let subject = format!("task {}", upid);
    let fetcher = retrying(TaskFetcher::new(client.without_retries(), node, upid.clone()));

    let status = ConvergenceWaiter::new(config, fetcher)
        .with_context(context.clone())
        .with_progress(TracingProgress::new(subject.clone()))
        .wait()
        .await
        .into_result_with(subject, |status: &TaskStatus| status.exitstatus.clone())?;

    if let Some(exit) = status.exitstatus.as_deref().filter(|e| *e != "OK") {
        tracing::warn!("Task {} finished with {}", upid, exit);
    }

    Ok(status)
}
