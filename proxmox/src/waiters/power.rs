use super::{retrying, WaiterError};
use crate::api::nodes::QemuStatus;
use crate::api::{ApiError, Client};
use async_trait::async_trait;
use converge::{
    Context, ConvergenceWaiter, FetchResult, Fetcher, TracingProgress, UnknownStatus, WaitConfig,
    WaitSettings,
};

/// Power state of a VM as seen through `status/current`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PowerState {
    Running,
    Stopped,
    /// Running according to the node, paused according to QMP
    Paused,
    /// The VM does not exist (HTTP 404)
    Absent,
    /// Any status string this client does not know
    Other(String),
}

impl PowerState {
    pub fn of(status: &QemuStatus) -> Self {
        match (status.status.as_str(), status.qmpstatus.as_deref()) {
            ("running", Some("paused")) => PowerState::Paused,
            ("running", _) => PowerState::Running,
            ("stopped", _) => PowerState::Stopped,
            (other, _) => PowerState::Other(other.to_string()),
        }
    }
}

/// Reads the power state of one VM. A missing VM is observed as
/// [`PowerState::Absent`] rather than an error.
pub struct VmPowerFetcher {
    client: Client,
    node: String,
    vmid: u32,
}

impl VmPowerFetcher {
    pub fn new(client: Client, node: &str, vmid: u32) -> Self {
        Self {
            client,
            node: node.to_string(),
            vmid,
        }
    }
}

#[async_trait]
impl Fetcher for VmPowerFetcher {
    type Status = PowerState;
    type Payload = Option<QemuStatus>;
    type Error = ApiError;

    async fn fetch(&self) -> Result<FetchResult<PowerState, Option<QemuStatus>>, ApiError> {
        match self
            .client
            .nodes()
            .node(&self.node)
            .qemu()
            .get_status(self.vmid)
            .await
        {
            Ok(status) => Ok(FetchResult::new(PowerState::of(&status), Some(status))),
            Err(err) if err.is_not_found() => Ok(FetchResult::new(PowerState::Absent, None)),
            Err(err) => Err(err),
        }
    }
}

/// Waits until the VM reports `target` and returns its last status body.
/// A VM that stays missing for more than `settings.not_found_checks`
/// consecutive polls fails the wait, so the body is only missing for
/// targets that are not power states.
pub async fn wait_for_power_state(
    client: &Client,
    node: &str,
    vmid: u32,
    target: PowerState,
    settings: &WaitSettings,
    context: &Context,
) -> Result<Option<QemuStatus>, WaiterError<PowerState>> {
    let transitional = [PowerState::Running, PowerState::Stopped, PowerState::Paused]
        .into_iter()
        .filter(|state| *state != target);

    let config = settings
        .apply(
            WaitConfig::builder()
                .target([target.clone()])
                .transitional(transitional)
                .failure([PowerState::Absent])
                .not_found(PowerState::Absent)
                .on_unknown(UnknownStatus::KeepPolling),
        )
        .build()?;

    let subject = format!("VM {} on {}", vmid, node);
    let fetcher = retrying(VmPowerFetcher::new(client.without_retries(), node, vmid));

    let status = ConvergenceWaiter::new(config, fetcher)
        .with_context(context.clone())
        .with_progress(TracingProgress::new(subject.clone()))
        .wait()
        .await
        .into_result(subject)?;

    Ok(status)
}

/// Waits until the VM is gone after a destroy
pub async fn wait_for_vm_removed(
    client: &Client,
    node: &str,
    vmid: u32,
    settings: &WaitSettings,
    context: &Context,
) -> Result<(), WaiterError<PowerState>> {
    let config = settings
        .apply(
            WaitConfig::builder()
                .target([PowerState::Absent])
                .transitional([PowerState::Running, PowerState::Stopped, PowerState::Paused])
                .on_unknown(UnknownStatus::KeepPolling),
        )
        .build()?;

    let subject = format!("removal of VM {} on {}", vmid, node);
    let fetcher = retrying(VmPowerFetcher::new(client.without_retries(), node, vmid));

    ConvergenceWaiter::new(config, fetcher)
        .with_context(context.clone())
        .with_progress(TracingProgress::new(subject.clone()))
        .wait()
        .await
        .into_result(subject)?;

    Ok(())
}
