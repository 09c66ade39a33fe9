//! Line-oriented operator shell on top of [`ThorController`].

use std::{collections::BTreeMap, io::Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, Lines};
use tracing::debug;

use crate::{
    axis::{AxisId, Direction},
    command_executor::ControllerError,
    controller::ThorController,
    dispatcher::{DispatchError, DispatchMode, gcode::format_position},
    ledger::PositionLedger,
};

const HELP: &str = "\
Commands:
  <axis> + [step]   move an axis (J1..J6) forward, default step when omitted
  <axis> - [step]   move an axis backward
  raw <command>     send a G-code line as is
  pos               show positions
  status            show dispatch mode and Moonraker connection
  help              show this text
  quit | exit       leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Move {
        axis: AxisId,
        direction: Direction,
        step: Option<String>,
    },
    Raw(String),
    Positions,
    Status,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected '+' or '-' after {0}")]
    MissingDirection(AxisId),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
}

pub fn parse_line(line: &str) -> Result<ShellCommand, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }

    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((line, ""));

    match head.to_lowercase().as_str() {
        "raw" => return Ok(ShellCommand::Raw(rest.to_string())),
        "pos" | "positions" => return Ok(ShellCommand::Positions),
        "status" => return Ok(ShellCommand::Status),
        "help" | "?" => return Ok(ShellCommand::Help),
        "quit" | "exit" => return Ok(ShellCommand::Quit),
        _ => {}
    }

    let axis = head
        .parse::<AxisId>()
        .map_err(|_| ParseError::UnknownCommand(head.to_string()))?;

    let (sign, step) = rest
        .split_once(char::is_whitespace)
        .map(|(sign, step)| (sign, step.trim()))
        .unwrap_or((rest, ""));

    let direction = match sign {
        "+" => Direction::Positive,
        "-" => Direction::Negative,
        _ => return Err(ParseError::MissingDirection(axis)),
    };

    Ok(ShellCommand::Move {
        axis,
        direction,
        step: (!step.is_empty()).then(|| step.to_string()),
    })
}

fn mode_line(mode: DispatchMode) -> &'static str {
    match mode {
        DispatchMode::DryRun => "Dry-run mode: ON",
        DispatchMode::Live => "Dry-run mode: OFF",
    }
}

fn connection_line(reachable: bool) -> &'static str {
    if reachable {
        "Moonraker connection: READY"
    } else {
        "Moonraker connection: NOT CONNECTED"
    }
}

pub struct Shell<R, W> {
    lines: Lines<R>,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        Ok(self.lines.next_line().await?)
    }

    /// Asks for the starting position of every axis.
    ///
    /// A blank answer keeps the value from `seeds` (zero when absent). Input
    /// ending early keeps the seeds for the remaining axes.
    pub async fn prompt_initial_positions(
        &mut self,
        seeds: &BTreeMap<AxisId, f64>,
    ) -> anyhow::Result<BTreeMap<AxisId, f64>> {
        let mut positions = seeds.clone();

        writeln!(self.output, "Enter initial positions (blank keeps the value shown)")?;

        'axes: for axis in AxisId::ALL {
            let current = seeds.get(&axis).copied().unwrap_or(0.0);
            loop {
                let prompt = format!("{} [{}]: ", axis, format_position(current));
                let Some(answer) = self.read_line(&prompt).await? else {
                    break 'axes;
                };

                let answer = answer.trim();
                if answer.is_empty() {
                    positions.insert(axis, current);
                    continue 'axes;
                }

                match answer.parse::<f64>() {
                    Ok(value) if value.is_finite() => {
                        positions.insert(axis, value);
                        continue 'axes;
                    }
                    _ => writeln!(self.output, "Invalid number '{}', try again", answer)?,
                }
            }
        }

        Ok(positions)
    }

    pub async fn run(&mut self, controller: &ThorController) -> anyhow::Result<()> {
        self.print_status(controller).await?;
        writeln!(self.output, "Type 'help' for commands.")?;

        while let Some(line) = self.read_line("> ").await? {
            debug!(line = %line, "Shell input");

            match parse_line(&line) {
                Ok(ShellCommand::Quit) => break,
                Ok(ShellCommand::Empty) => {}
                Ok(ShellCommand::Help) => writeln!(self.output, "{}", HELP)?,
                Ok(ShellCommand::Status) => self.print_status(controller).await?,
                Ok(ShellCommand::Positions) => {
                    let positions = controller.sender().positions().await?;
                    self.print_positions(&positions)?;
                }
                Ok(ShellCommand::Move {
                    axis,
                    direction,
                    step,
                }) => self.move_axis(controller, axis, direction, step).await?,
                Ok(ShellCommand::Raw(text)) => self.send_raw(controller, text).await?,
                Err(e) => writeln!(self.output, "{}. Type 'help' for commands.", e)?,
            }
        }

        Ok(())
    }

    async fn print_status(&mut self, controller: &ThorController) -> anyhow::Result<()> {
        let reachable = controller.probe().is_reachable().await;
        writeln!(self.output, "{}", mode_line(controller.mode()))?;
        writeln!(self.output, "{}", connection_line(reachable))?;
        Ok(())
    }

    fn print_positions(&mut self, positions: &PositionLedger) -> anyhow::Result<()> {
        writeln!(self.output, "{}", positions)?;
        Ok(())
    }

    async fn move_axis(
        &mut self,
        controller: &ThorController,
        axis: AxisId,
        direction: Direction,
        step: Option<String>,
    ) -> anyhow::Result<()> {
        let status = match controller.sender().move_axis(axis, direction, step).await {
            Ok(report) => match report.outcome {
                Ok(_) => format!("{} moved to {}", axis, format_position(report.position)),
                Err(DispatchError::DispatchFailed(e)) => format!("Failed to move {}: {}", axis, e),
                Err(e) => format!("Failed to move {}: {}", axis, e),
            },
            Err(ControllerError::Dispatch(DispatchError::InvalidStep { .. })) => {
                format!("Invalid step value for {}", axis)
            }
            Err(ControllerError::Dispatch(e)) => format!("Failed to move {}: {}", axis, e),
            Err(e) => return Err(e.into()),
        };

        let positions = controller.sender().positions().await?;
        self.print_positions(&positions)?;
        writeln!(self.output, "{}", status)?;
        Ok(())
    }

    async fn send_raw(&mut self, controller: &ThorController, text: String) -> anyhow::Result<()> {
        let status = match controller.sender().send_raw(text).await {
            Ok(_) => "Custom command sent".to_string(),
            Err(ControllerError::Dispatch(DispatchError::EmptyCommand)) => {
                "No command entered".to_string()
            }
            Err(ControllerError::Dispatch(DispatchError::DispatchFailed(e))) => {
                format!("Failed: {}", e)
            }
            Err(ControllerError::Dispatch(e)) => format!("Failed: {}", e),
            Err(e) => return Err(e.into()),
        };

        writeln!(self.output, "{}", status)?;
        Ok(())
    }
}
