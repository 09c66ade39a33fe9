//! HTTP transport for the Moonraker API that fronts a Klipper machine.
//!
//! Only two exchanges are needed: running a G-code script and checking that
//! the printer object answers. Neither retries; callers own that policy.

use async_trait::async_trait;

pub mod client;
pub mod envelope;
pub mod error;

pub use client::MoonrakerClient;
pub use envelope::CommandEnvelope;
pub use error::TransportError;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs the envelope's script on the backend and returns the decoded reply.
    async fn execute(&self, envelope: &CommandEnvelope)
    -> Result<serde_json::Value, TransportError>;

    /// `true` only when the backend answered its info endpoint with a success status.
    async fn probe(&self) -> bool;
}
