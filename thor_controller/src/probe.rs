use std::sync::Arc;

use moonraker::Transport;
use tracing::debug;

/// Answers whether Moonraker is reachable right now.
///
/// Holds its own handle on the transport, so it can be polled while the
/// dispatcher is busy with a move.
#[derive(Clone)]
pub struct ConnectivityProbe {
    transport: Arc<dyn Transport>,
}

impl ConnectivityProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn is_reachable(&self) -> bool {
        let reachable = self.transport.probe().await;
        debug!(reachable, "Connectivity probe finished");
        reachable
    }
}
