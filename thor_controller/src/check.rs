use std::io::Write;

use tracing::warn;

use crate::{command_executor::ControllerError, controller::ThorController};

/// Probes Moonraker and, when it answers, sends `gcode` and prints the reply.
///
/// Returns whether both steps succeeded.
pub async fn run<W: Write>(
    controller: &ThorController,
    gcode: &str,
    output: &mut W,
) -> anyhow::Result<bool> {
    if !controller.probe().is_reachable().await {
        writeln!(output, "Moonraker connection: FAILED")?;
        return Ok(false);
    }
    writeln!(output, "Moonraker connection: READY")?;

    match controller.sender().send_raw(gcode.to_string()).await {
        Ok(ack) => {
            writeln!(output, "Sent '{}' ({} mode)", ack.command, ack.mode)?;
            match ack.payload {
                Some(payload) => writeln!(output, "{}", serde_json::to_string_pretty(&payload)?)?,
                None => writeln!(output, "Dry run, no response")?,
            }
            Ok(true)
        }
        Err(ControllerError::Dispatch(e)) => {
            warn!("Test command '{}' failed: {}", gcode, e);
            writeln!(output, "Test command failed: {}", e)?;
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
