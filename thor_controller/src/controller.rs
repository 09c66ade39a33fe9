use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::Context as _;
use moonraker::{MoonrakerClient, Transport};
use tokio::task::JoinHandle;
use tracing::info;
use utilities::command_executor::CommandExecutor;

use crate::{
    axis::AxisId,
    command_executor::command_sender::DispatcherCommandSender,
    config::{BackendConfig, ThorConfig},
    dispatcher::{DispatchMode, Dispatcher, DispatcherConfig},
    ledger::PositionLedger,
    probe::ConnectivityProbe,
};

pub struct ThorController {
    sender: DispatcherCommandSender,
    probe: ConnectivityProbe,
    mode: DispatchMode,
    executor_handle: JoinHandle<Dispatcher>,
}

impl ThorController {
    /// Spawns the dispatcher on its own task. Needs a running tokio runtime.
    pub fn new(config: DispatcherConfig, transport: Arc<dyn Transport>) -> Self {
        let mode = config.mode;
        let probe = ConnectivityProbe::new(transport.clone());

        let executor = CommandExecutor::new(Dispatcher::new(config, transport));
        let sender = DispatcherCommandSender::new(executor.sender());
        let executor_handle = executor.spawn();

        Self {
            sender,
            probe,
            mode,
            executor_handle,
        }
    }

    pub fn sender(&self) -> &DispatcherCommandSender {
        &self.sender
    }

    pub fn probe(&self) -> &ConnectivityProbe {
        &self.probe
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Stops the dispatcher task and returns the final positions.
    pub async fn shutdown(self) -> anyhow::Result<PositionLedger> {
        drop(self.sender);

        let dispatcher = self
            .executor_handle
            .await
            .context("Dispatcher task failed")?;

        info!("Final positions: {}", dispatcher.ledger());
        Ok(dispatcher.ledger().clone())
    }
}

pub fn create_client(config: &BackendConfig) -> anyhow::Result<MoonrakerClient> {
    let client = MoonrakerClient::new(&config.host, config.port)
        .context("Failed to create Moonraker client")?
        .with_request_timeout(Duration::from_millis(config.request_timeout_ms))
        .with_probe_timeout(Duration::from_millis(config.probe_timeout_ms));

    Ok(client)
}

pub fn create_controller(
    config: &ThorConfig,
    initial_positions: BTreeMap<AxisId, f64>,
) -> anyhow::Result<ThorController> {
    let client = create_client(&config.backend)?;
    info!(base_url = client.base_url(), "Using Moonraker backend");

    let mut dispatcher_config = config.dispatcher_config();
    dispatcher_config.initial_positions = initial_positions;

    Ok(ThorController::new(dispatcher_config, Arc::new(client)))
}
