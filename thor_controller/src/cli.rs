use std::{ffi::OsString, path::PathBuf};

use clap::{Parser, Subcommand};

use crate::{axis::AxisId, config::ThorConfig, dispatcher::DispatchMode};

#[derive(Parser, Debug)]
#[command(version, about = "Manual stepper control for the Thor arm", long_about = None)]
struct ClapArgs {
    /// Configuration file, overrides CONFIG_PATH
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Moonraker host, e.g. http://192.168.1.96
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Log commands instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Starting position of an axis, e.g. --position J1=12.5
    #[arg(long = "position", value_name = "AXIS=VALUE", value_parser = parse_position_seed)]
    positions: Vec<PositionSeed>,

    /// Ask for every starting position before the shell opens
    #[arg(long)]
    prompt_positions: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Mode {
    /// Interactive jog shell (default)
    Shell,
    /// Probe Moonraker and send one test command
    Check {
        #[arg(long, default_value = "M115")]
        gcode: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSeed {
    pub axis: AxisId,
    pub position: f64,
}

fn parse_position_seed(value: &str) -> Result<PositionSeed, String> {
    let (axis, position) = value
        .split_once('=')
        .ok_or_else(|| format!("expected AXIS=VALUE, got '{}'", value))?;

    let axis = axis.parse::<AxisId>().map_err(|e| e.to_string())?;
    let position = position
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|position| position.is_finite())
        .ok_or_else(|| format!("invalid position '{}'", position.trim()))?;

    Ok(PositionSeed { axis, position })
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    dry_run: bool,
    positions: Vec<PositionSeed>,
    prompt_positions: bool,
    mode: Mode,
}

impl From<ClapArgs> for CommandLineArgs {
    fn from(args: ClapArgs) -> Self {
        Self {
            config: args.config,
            host: args.host,
            port: args.port,
            dry_run: args.dry_run,
            positions: args.positions,
            prompt_positions: args.prompt_positions,
            mode: args.mode.unwrap_or(Mode::Shell),
        }
    }
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        ClapArgs::parse().into()
    }

    #[allow(dead_code)]
    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::parse_from(itr).into()
    }

    pub fn config(&self) -> Option<&std::path::Path> {
        self.config.as_deref()
    }

    pub fn prompt_positions(&self) -> bool {
        self.prompt_positions
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Command-line values take precedence over the file.
    pub fn apply_to(&self, config: &mut ThorConfig) {
        if let Some(host) = &self.host {
            config.backend.host = host.clone();
        }
        if let Some(port) = self.port {
            config.backend.port = port;
        }
        if self.dry_run {
            config.dispatch.mode = DispatchMode::DryRun;
        }
        for seed in &self.positions {
            config.initial_positions.insert(seed.axis, seed.position);
        }
    }
}
