use utilities::command_executor::{DeviceHandler, ExecutorError};

use crate::{
    command_executor::commands::DispatcherCommand,
    dispatcher::{DispatchError, Dispatcher},
};

pub mod command_sender;
pub mod commands;

impl DeviceHandler for Dispatcher {
    type Command = DispatcherCommand;
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("Unexpected response type")]
    UnexpectedResponse,
}
