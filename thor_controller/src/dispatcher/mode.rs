use std::{fmt, sync::Arc};

use async_trait::async_trait;
use moonraker::{CommandEnvelope, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dispatcher::DispatchError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    Live,
    DryRun,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Live => f.write_str("live"),
            DispatchMode::DryRun => f.write_str("dry run"),
        }
    }
}

/// A command the backend accepted, or would have in dry-run mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Acknowledgement {
    pub command: String,
    pub mode: DispatchMode,
    /// Decoded reply from the backend. Always `None` in dry-run mode.
    pub payload: Option<serde_json::Value>,
}

/// Where constructed commands go once the dispatcher is done with them.
#[async_trait]
pub trait CommandSink: Send + Sync {
    fn mode(&self) -> DispatchMode;

    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<Acknowledgement, DispatchError>;
}

pub struct LiveSink {
    transport: Arc<dyn Transport>,
}

impl LiveSink {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl CommandSink for LiveSink {
    fn mode(&self) -> DispatchMode {
        DispatchMode::Live
    }

    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<Acknowledgement, DispatchError> {
        debug!("Sending G-code: {}", envelope.script());

        let payload = self.transport.execute(&envelope).await?;

        Ok(Acknowledgement {
            command: envelope.script().to_string(),
            mode: DispatchMode::Live,
            payload: Some(payload),
        })
    }
}

pub struct DryRunSink;

#[async_trait]
impl CommandSink for DryRunSink {
    fn mode(&self) -> DispatchMode {
        DispatchMode::DryRun
    }

    async fn dispatch(&self, envelope: CommandEnvelope) -> Result<Acknowledgement, DispatchError> {
        info!("Dry run, not sending G-code: {}", envelope.script());

        Ok(Acknowledgement {
            command: envelope.script().to_string(),
            mode: DispatchMode::DryRun,
            payload: None,
        })
    }
}

pub fn create_sink(mode: DispatchMode, transport: Arc<dyn Transport>) -> Box<dyn CommandSink> {
    match mode {
        DispatchMode::Live => Box::new(LiveSink::new(transport)),
        DispatchMode::DryRun => Box::new(DryRunSink),
    }
}
