//! Turns joint moves and raw text into backend commands.
//!
//! A move always updates the position ledger before the command is sent and
//! the update is never rolled back. When sending fails the ledger keeps the
//! requested position and the caller gets the failure alongside it, so the
//! tracked position can run ahead of the machine until the operator corrects
//! it.

use std::{collections::BTreeMap, sync::Arc};

use moonraker::{CommandEnvelope, Transport};
use tracing::{info, instrument, warn};

use crate::{
    axis::{AxisBindings, AxisId, Direction},
    ledger::PositionLedger,
};

pub mod error;
pub mod gcode;
pub mod mode;

pub use error::DispatchError;
pub use mode::{Acknowledgement, CommandSink, DispatchMode};

pub const DEFAULT_STEP: f64 = 10.0;
pub const DEFAULT_SPEED: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub bindings: AxisBindings,
    pub initial_positions: BTreeMap<AxisId, f64>,
    pub mode: DispatchMode,
    pub default_step: f64,
    pub default_speed: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            bindings: AxisBindings::default(),
            initial_positions: BTreeMap::new(),
            mode: DispatchMode::Live,
            default_step: DEFAULT_STEP,
            default_speed: DEFAULT_SPEED,
        }
    }
}

/// Outcome of a move whose step was valid.
#[derive(Debug)]
pub struct MoveReport {
    pub axis: AxisId,
    /// Ledger position after the move, reported whether or not sending worked.
    pub position: f64,
    pub command: String,
    pub outcome: Result<Acknowledgement, DispatchError>,
}

impl MoveReport {
    pub fn is_confirmed(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct Dispatcher {
    bindings: AxisBindings,
    ledger: PositionLedger,
    sink: Box<dyn CommandSink>,
    default_step: f64,
    default_speed: f64,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig, transport: Arc<dyn Transport>) -> Self {
        info!(mode = %config.mode, "Creating dispatcher");

        Self {
            ledger: PositionLedger::seeded(&config.initial_positions),
            sink: mode::create_sink(config.mode, transport),
            bindings: config.bindings,
            default_step: config.default_step,
            default_speed: config.default_speed,
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.sink.mode()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn position(&self, axis: AxisId) -> Result<f64, DispatchError> {
        self.ledger.get(axis)
    }

    /// Moves `axis` by one step in `direction`.
    ///
    /// `step` is the text the operator typed, if any. Returns `Err` only when
    /// nothing was changed; dispatch failures come back inside the report.
    #[instrument(skip(self))]
    pub async fn move_axis(
        &mut self,
        axis: AxisId,
        direction: Direction,
        step: Option<&str>,
    ) -> Result<MoveReport, DispatchError> {
        let step = gcode::resolve_step(step, self.default_step).inspect_err(|e| {
            warn!("Rejected move of {}: {}", axis, e);
        })?;

        let position = self.ledger.apply_delta(axis, step * direction.sign());

        let actuator = self.bindings.actuator(axis)?;
        let command = gcode::manual_stepper_move(actuator, position, self.default_speed);

        let outcome = self
            .sink
            .dispatch(CommandEnvelope::new(command.clone()))
            .await;

        match &outcome {
            Ok(_) => info!("{} moved to {}", axis, gcode::format_position(position)),
            Err(e) => warn!(
                "Failed to move {}, ledger keeps {}: {}",
                axis,
                gcode::format_position(position),
                e
            ),
        }

        Ok(MoveReport {
            axis,
            position,
            command,
            outcome,
        })
    }

    /// Sends `text` to the backend verbatim.
    #[instrument(skip(self))]
    pub async fn send_raw(&self, text: &str) -> Result<Acknowledgement, DispatchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DispatchError::EmptyCommand);
        }

        self.sink.dispatch(CommandEnvelope::new(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use moonraker::{MoonrakerClient, TransportError};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn dispatcher(mode: DispatchMode, transport: Arc<RecordingTransport>) -> Dispatcher {
        Dispatcher::new(
            DispatcherConfig {
                mode,
                ..Default::default()
            },
            transport,
        )
    }

    #[test]
    fn starts_from_zero_without_seed() {
        let dispatcher = dispatcher(DispatchMode::DryRun, RecordingTransport::accepting());

        for axis in AxisId::ALL {
            assert_eq!(dispatcher.position(axis).unwrap(), 0.0);
        }
    }

    #[test]
    fn starts_from_seed() {
        let dispatcher = Dispatcher::new(
            DispatcherConfig {
                initial_positions: BTreeMap::from([(AxisId::J5, 45.0)]),
                ..Default::default()
            },
            RecordingTransport::accepting(),
        );

        assert_eq!(dispatcher.position(AxisId::J5).unwrap(), 45.0);
        assert_eq!(dispatcher.position(AxisId::J1).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn dry_run_scenario() {
        let transport = RecordingTransport::accepting();
        let mut dispatcher = dispatcher(DispatchMode::DryRun, transport.clone());

        let report = dispatcher
            .move_axis(AxisId::J1, Direction::Positive, None)
            .await
            .unwrap();
        assert_eq!(report.position, 10.0);
        assert_eq!(
            report.command,
            "manual_stepper stepper=stepper_j1 move=10.0 speed=5"
        );
        let ack = report.outcome.unwrap();
        assert_eq!(ack.command, report.command);
        assert_eq!(ack.mode, DispatchMode::DryRun);
        assert!(ack.payload.is_none());

        let report = dispatcher
            .move_axis(AxisId::J1, Direction::Positive, Some("2.5"))
            .await
            .unwrap();
        assert_eq!(report.position, 12.5);
        assert_eq!(
            report.outcome.unwrap().command,
            "manual_stepper stepper=stepper_j1 move=12.5 speed=5"
        );

        let report = dispatcher
            .move_axis(AxisId::J1, Direction::Negative, None)
            .await
            .unwrap();
        assert_eq!(report.position, 2.5);
        assert_eq!(dispatcher.position(AxisId::J1).unwrap(), 2.5);

        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn default_step_moves_both_ways() {
        let mut dispatcher = dispatcher(DispatchMode::DryRun, RecordingTransport::accepting());

        dispatcher
            .move_axis(AxisId::J3, Direction::Negative, None)
            .await
            .unwrap();
        assert_eq!(dispatcher.position(AxisId::J3).unwrap(), -10.0);

        dispatcher
            .move_axis(AxisId::J3, Direction::Positive, Some("  "))
            .await
            .unwrap();
        assert_eq!(dispatcher.position(AxisId::J3).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn invalid_step_changes_nothing() {
        let transport = RecordingTransport::accepting();
        let mut dispatcher = dispatcher(DispatchMode::Live, transport.clone());
        dispatcher
            .move_axis(AxisId::J2, Direction::Positive, Some("4"))
            .await
            .unwrap();

        let err = dispatcher
            .move_axis(AxisId::J2, Direction::Positive, Some("abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidStep { input } if input == "abc"));
        assert_eq!(dispatcher.position(AxisId::J2).unwrap(), 4.0);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn live_move_sends_command() {
        let transport = RecordingTransport::accepting();
        let mut dispatcher = dispatcher(DispatchMode::Live, transport.clone());

        let report = dispatcher
            .move_axis(AxisId::J6, Direction::Negative, Some("0.5"))
            .await
            .unwrap();

        assert!(report.is_confirmed());
        assert_eq!(
            transport.scripts(),
            vec!["manual_stepper stepper=stepper_j6 move=-0.5 speed=5"]
        );
        let ack = report.outcome.unwrap();
        assert_eq!(ack.mode, DispatchMode::Live);
        assert_eq!(ack.payload, Some(json!({ "result": "ok" })));
    }

    #[tokio::test]
    async fn failed_dispatch_keeps_position() {
        let transport = RecordingTransport::failing(500);
        let mut dispatcher = dispatcher(DispatchMode::Live, transport.clone());

        let report = dispatcher
            .move_axis(AxisId::J4, Direction::Positive, None)
            .await
            .unwrap();

        assert_eq!(report.position, 10.0);
        assert!(!report.is_confirmed());
        assert!(matches!(
            report.outcome,
            Err(DispatchError::DispatchFailed(TransportError::Status { status: 500, .. }))
        ));
        assert_eq!(dispatcher.position(AxisId::J4).unwrap(), 10.0);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn unbound_axis_is_reported_after_ledger_update() {
        let transport = RecordingTransport::accepting();
        let mut dispatcher = Dispatcher::new(
            DispatcherConfig {
                bindings: AxisBindings::new(BTreeMap::from([(
                    AxisId::J1,
                    "stepper_j1".to_string(),
                )])),
                ..Default::default()
            },
            transport.clone(),
        );

        let err = dispatcher
            .move_axis(AxisId::J2, Direction::Positive, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::UnknownAxis(name) if name == "J2"));
        assert_eq!(dispatcher.position(AxisId::J2).unwrap(), 10.0);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn blank_raw_command_is_rejected() {
        let transport = RecordingTransport::accepting();
        let dispatcher = dispatcher(DispatchMode::Live, transport.clone());

        for text in ["", "   ", "\t\n"] {
            assert!(matches!(
                dispatcher.send_raw(text).await,
                Err(DispatchError::EmptyCommand)
            ));
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn raw_command_is_sent_verbatim() {
        let transport = RecordingTransport::accepting();
        let dispatcher = dispatcher(DispatchMode::Live, transport.clone());

        let ack = dispatcher
            .send_raw("  manual_stepper stepper=stepper_j1 move=50 speed=5 ")
            .await
            .unwrap();

        assert_eq!(
            ack.command,
            "manual_stepper stepper=stepper_j1 move=50 speed=5"
        );
        assert_eq!(transport.scripts(), vec![ack.command.clone()]);
        assert_eq!(dispatcher.position(AxisId::J1).unwrap(), 0.0);
    }

    #[tokio::test]
    async fn raw_command_in_dry_run_is_not_sent() {
        let transport = RecordingTransport::accepting();
        let dispatcher = dispatcher(DispatchMode::DryRun, transport.clone());

        let ack = dispatcher.send_raw("M115").await.unwrap();

        assert_eq!(ack.command, "M115");
        assert_eq!(ack.mode, DispatchMode::DryRun);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn raw_command_failure_is_dispatch_failed() {
        let dispatcher = dispatcher(DispatchMode::Live, RecordingTransport::failing(400));

        assert!(matches!(
            dispatcher.send_raw("G28").await,
            Err(DispatchError::DispatchFailed(_))
        ));
    }

    #[tokio::test]
    async fn live_move_reaches_moonraker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/printer/gcode/script"))
            .and(body_json(json!({
                "script": "manual_stepper stepper=stepper_j2 move=-10.0 speed=5"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MoonrakerClient::from_base_url(&server.uri()).unwrap();
        let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), Arc::new(client));

        let report = dispatcher
            .move_axis(AxisId::J2, Direction::Negative, None)
            .await
            .unwrap();

        assert_eq!(report.position, -10.0);
        assert_eq!(
            report.outcome.unwrap().payload,
            Some(json!({ "result": "ok" }))
        );
    }

    #[tokio::test]
    async fn live_move_against_failing_moonraker() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/printer/gcode/script"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = MoonrakerClient::from_base_url(&server.uri()).unwrap();
        let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), Arc::new(client));

        let report = dispatcher
            .move_axis(AxisId::J1, Direction::Positive, Some("1.5"))
            .await
            .unwrap();

        assert!(!report.is_confirmed());
        assert_eq!(dispatcher.position(AxisId::J1).unwrap(), 1.5);
    }
}
