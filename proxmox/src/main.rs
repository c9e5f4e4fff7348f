use clap::{Parser, Subcommand, ValueEnum};
use converge::{Context, WaitSettings};
use proxmox::api::{Client, TaskId};
use proxmox::{PowerState, ProviderConfig};
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Wait for Proxmox VE operations to finish", long_about = None)]
struct Args {
    /// API endpoint, e.g. https://pve.example.com:8006
    #[arg(long, env = "PROXMOX_ENDPOINT")]
    endpoint: Option<String>,

    /// API token as user@realm!tokenid=secret
    #[arg(long, env = "PROXMOX_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Accept self-signed certificates
    #[arg(long)]
    insecure: bool,

    /// Overall timeout in seconds, replacing the configured one
    #[arg(long)]
    timeout: Option<u64>,

    /// Log every poll
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait for a worker task to stop
    Task {
        upid: String,
        /// Node running the task, taken from the UPID when omitted
        #[arg(long)]
        node: Option<String>,
    },
    /// Wait for a VM to reach a power state
    Power {
        #[arg(long)]
        node: String,
        #[arg(long)]
        vmid: u32,
        #[arg(long, value_enum)]
        state: TargetPower,
    },
    /// Wait for a destroyed VM to disappear
    Removed {
        #[arg(long)]
        node: String,
        #[arg(long)]
        vmid: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TargetPower {
    Running,
    Stopped,
    Paused,
}

impl From<TargetPower> for PowerState {
    fn from(target: TargetPower) -> Self {
        match target {
            TargetPower::Running => PowerState::Running,
            TargetPower::Stopped => PowerState::Stopped,
            TargetPower::Paused => PowerState::Paused,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = ProviderConfig::from_env()?;
    config.endpoint = args.endpoint.or(config.endpoint);
    config.api_token = args.api_token.or(config.api_token);
    if args.insecure {
        config.insecure = Some(true);
    }
    let client = config.client()?;

    let context = Context::new();
    let canceller = context.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Received SIGINT, cancelling wait");
            canceller.cancel();
        }
    });

    let with_timeout = |mut settings: WaitSettings| {
        if let Some(secs) = args.timeout {
            settings.timeout = Duration::from_secs(secs);
        }
        settings
    };

    match args.command {
        Command::Task { upid, node } => {
            let upid = TaskId::new(upid);
            let node = node
                .or_else(|| upid.node().map(str::to_string))
                .ok_or("--node is required when the UPID does not name a node")?;
            let settings = with_timeout(config.timeouts.task.clone());
            wait_task(&client, &node, &upid, &settings, &context).await
        }
        Command::Power { node, vmid, state } => {
            let settings = with_timeout(config.timeouts.power.clone());
            proxmox::wait_for_power_state(
                &client,
                &node,
                vmid,
                state.into(),
                &settings,
                &context,
            )
            .await?;
            info!("VM {} on {} is {:?}", vmid, node, state);
            Ok(())
        }
        Command::Removed { node, vmid } => {
            let settings = with_timeout(config.timeouts.delete.clone());
            proxmox::wait_for_vm_removed(&client, &node, vmid, &settings, &context).await?;
            info!("VM {} on {} is gone", vmid, node);
            Ok(())
        }
    }
}

async fn wait_task(
    client: &Client,
    node: &str,
    upid: &TaskId,
    settings: &WaitSettings,
    context: &Context,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let status = proxmox::wait_for_task(client, node, upid, settings, context).await?;
    info!(
        "Task {} ({}) finished: {}",
        upid,
        upid.task_type().unwrap_or("unknown"),
        status.exitstatus.as_deref().unwrap_or("OK")
    );
    Ok(())
}
