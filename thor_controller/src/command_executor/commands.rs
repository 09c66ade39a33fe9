use async_trait::async_trait;
use utilities::command_executor::Command;

use crate::{
    axis::{AxisId, Direction},
    dispatcher::{Acknowledgement, DispatchError, Dispatcher, MoveReport},
    ledger::PositionLedger,
};

pub enum DispatcherCommand {
    Move {
        axis: AxisId,
        direction: Direction,
        step: Option<String>,
    },
    SendRaw {
        text: String,
    },
    Positions,
}

pub enum CommandResponse {
    Moved(Result<MoveReport, DispatchError>),
    Sent(Result<Acknowledgement, DispatchError>),
    Positions(PositionLedger),
}

#[async_trait]
impl Command for DispatcherCommand {
    type Response = CommandResponse;
    type Handler = Dispatcher;

    async fn execute(self, dispatcher: &mut Dispatcher) -> CommandResponse {
        match self {
            DispatcherCommand::Move {
                axis,
                direction,
                step,
            } => CommandResponse::Moved(
                dispatcher
                    .move_axis(axis, direction, step.as_deref())
                    .await,
            ),
            DispatcherCommand::SendRaw { text } => {
                CommandResponse::Sent(dispatcher.send_raw(&text).await)
            }
            DispatcherCommand::Positions => {
                CommandResponse::Positions(dispatcher.ledger().clone())
            }
        }
    }
}
