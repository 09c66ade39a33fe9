use moonraker::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid step value '{input}'")]
    InvalidStep { input: String },

    #[error("No command entered")]
    EmptyCommand,

    #[error("Unknown axis: {0}")]
    UnknownAxis(String),

    #[error("Dispatch failed: {0}")]
    DispatchFailed(#[from] TransportError),
}
