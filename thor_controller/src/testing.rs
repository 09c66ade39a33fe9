use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use moonraker::{CommandEnvelope, Transport, TransportError};
use serde_json::json;

/// Transport double that records every script it is asked to run.
pub struct RecordingTransport {
    scripts: Mutex<Vec<String>>,
    probes: AtomicUsize,
    failure_status: Option<u16>,
    reachable: bool,
}

impl RecordingTransport {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
            failure_status: None,
            reachable: true,
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
            failure_status: Some(status),
            reachable: false,
        })
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<serde_json::Value, TransportError> {
        self.scripts
            .lock()
            .unwrap()
            .push(envelope.script().to_string());

        match self.failure_status {
            Some(status) => Err(TransportError::Status {
                status,
                body: "simulated failure".to_string(),
            }),
            None => Ok(json!({ "result": "ok" })),
        }
    }

    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}
