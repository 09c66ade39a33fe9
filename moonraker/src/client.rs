use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::{CommandEnvelope, Transport, TransportError};

const SCRIPT_ENDPOINT: &str = "/printer/gcode/script";
const INFO_ENDPOINT: &str = "/printer/info";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct MoonrakerClient {
    base_url: String,
    client: reqwest::Client,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl MoonrakerClient {
    /// `host` may omit the scheme, plain `http` is assumed then.
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        let host = host.trim_end_matches('/');
        let base_url = if host.contains("://") {
            format!("{}:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        };

        Self::from_base_url(&base_url)
    }

    pub fn from_base_url(base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for MoonrakerClient {
    #[instrument(skip(self, envelope), fields(script = %envelope.script()))]
    async fn execute(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<serde_json::Value, TransportError> {
        let url = self.url(SCRIPT_ENDPOINT);
        debug!("Sending G-code to {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send command: {}", e);
                TransportError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Moonraker returned {}: {}", status.as_u16(), body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Decode(e.to_string())
                }
            })?;

        debug!("Command accepted");
        Ok(payload)
    }

    async fn probe(&self) -> bool {
        let url = self.url(INFO_ENDPOINT);

        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Connection test to {} answered {}", url, response.status());
                false
            }
            Err(e) => {
                debug!("Connection test to {} failed: {}", url, e);
                false
            }
        }
    }
}
