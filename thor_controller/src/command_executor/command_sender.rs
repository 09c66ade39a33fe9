use utilities::command_executor::CommandSender;

use crate::{
    axis::{AxisId, Direction},
    command_executor::{
        ControllerError,
        commands::{CommandResponse, DispatcherCommand},
    },
    dispatcher::{Acknowledgement, MoveReport},
    ledger::PositionLedger,
};

#[derive(Clone)]
pub struct DispatcherCommandSender {
    sender: CommandSender<DispatcherCommand>,
}

impl DispatcherCommandSender {
    pub fn new(sender: CommandSender<DispatcherCommand>) -> Self {
        Self { sender }
    }

    pub async fn move_axis(
        &self,
        axis: AxisId,
        direction: Direction,
        step: Option<String>,
    ) -> Result<MoveReport, ControllerError> {
        let response = self
            .sender
            .send_command(DispatcherCommand::Move {
                axis,
                direction,
                step,
            })
            .await?;

        match response {
            CommandResponse::Moved(report) => Ok(report?),
            _ => Err(ControllerError::UnexpectedResponse),
        }
    }

    pub async fn send_raw(&self, text: String) -> Result<Acknowledgement, ControllerError> {
        let response = self
            .sender
            .send_command(DispatcherCommand::SendRaw { text })
            .await?;

        match response {
            CommandResponse::Sent(ack) => Ok(ack?),
            _ => Err(ControllerError::UnexpectedResponse),
        }
    }

    pub async fn positions(&self) -> Result<PositionLedger, ControllerError> {
        let response = self.sender.send_command(DispatcherCommand::Positions).await?;

        match response {
            CommandResponse::Positions(ledger) => Ok(ledger),
            _ => Err(ControllerError::UnexpectedResponse),
        }
    }
}
