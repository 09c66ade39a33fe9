use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::{
    axis::{AxisBindings, AxisId},
    dispatcher::{DEFAULT_SPEED, DEFAULT_STEP, DispatchMode, DispatcherConfig},
};

const DEFAULT_CONFIG_PATH: &str = "thor_config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file: {source}")]
    ReadError { source: std::io::Error },

    #[error("Failed to parse configuration: {source}")]
    ParseError { source: toml::de::Error },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError { source: toml::ser::Error },

    #[error("Failed to write configuration file: {source}")]
    WriteError { source: std::io::Error },

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Moonraker host, scheme included.
    pub host: String,
    pub port: u16,
    pub request_timeout_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: String::from("http://192.168.1.96"),
            port: 7125,
            request_timeout_ms: 5000,
            probe_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    pub default_step: f64,
    pub default_speed: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Live,
            default_step: DEFAULT_STEP,
            default_speed: DEFAULT_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is not set.
    pub level: String,
    pub json: bool,
    /// Also write JSON logs to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            json: false,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThorConfig {
    pub backend: BackendConfig,
    pub dispatch: DispatchConfig,
    pub axes: BTreeMap<AxisId, String>,
    pub initial_positions: BTreeMap<AxisId, f64>,
    pub logging: LoggingConfig,
}

impl Default for ThorConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            dispatch: DispatchConfig::default(),
            axes: AxisId::ALL
                .into_iter()
                .map(|axis| (axis, axis.default_actuator()))
                .collect(),
            initial_positions: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ThorConfig {
    pub fn bindings(&self) -> AxisBindings {
        AxisBindings::new(self.axes.clone())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            bindings: self.bindings(),
            initial_positions: self.initial_positions.clone(),
            mode: self.dispatch.mode,
            default_step: self.dispatch.default_step,
            default_speed: self.dispatch.default_speed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::ValidationError { message });

        let unbound = self.bindings().unbound();
        if !unbound.is_empty() {
            let names: Vec<&str> = unbound.iter().map(AxisId::as_str).collect();
            return invalid(format!("no actuator bound to {}", names.join(", ")));
        }

        if !(self.dispatch.default_step.is_finite() && self.dispatch.default_step > 0.0) {
            return invalid(format!(
                "default_step must be a positive number, got {}",
                self.dispatch.default_step
            ));
        }

        if !(self.dispatch.default_speed.is_finite() && self.dispatch.default_speed > 0.0) {
            return invalid(format!(
                "default_speed must be a positive number, got {}",
                self.dispatch.default_speed
            ));
        }

        if self.backend.request_timeout_ms == 0 || self.backend.probe_timeout_ms == 0 {
            return invalid("backend timeouts must be greater than zero".to_string());
        }

        if let Some((axis, _)) = self
            .initial_positions
            .iter()
            .find(|(_, position)| !position.is_finite())
        {
            return invalid(format!("initial position of {} is not a number", axis));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct ConfigOptions {
    pub config_path: PathBuf,
    pub create_if_missing: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            config_path: Self::default_config_path(),
            create_if_missing: true,
        }
    }
}

impl ConfigOptions {
    pub fn default_config_path() -> PathBuf {
        std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    options: ConfigOptions,
}

impl ConfigManager {
    pub fn with_options(options: ConfigOptions) -> Self {
        Self { options }
    }

    pub fn path(&self) -> &Path {
        &self.options.config_path
    }

    pub fn load(&self) -> anyhow::Result<ThorConfig> {
        let config_path = &self.options.config_path;

        if !config_path.exists() {
            if self.options.create_if_missing {
                let default_config = ThorConfig::default();
                self.save(&default_config)
                    .context("Failed to save default config")?;
                return Ok(default_config);
            } else {
                return Err(ConfigError::FileNotFound {
                    path: config_path.clone(),
                }
                .into());
            }
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError { source: e })?;

        let config: ThorConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { source: e })?;

        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config: &ThorConfig) -> anyhow::Result<()> {
        let config_path = &self.options.config_path;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(config_path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

fn options_for(path: Option<&Path>) -> ConfigOptions {
    path.map(ConfigOptions::with_path).unwrap_or_default()
}

pub fn init_config(path: Option<&Path>) -> anyhow::Result<(ConfigManager, ThorConfig)> {
    let manager = ConfigManager::with_options(options_for(path));
    let config = manager.load()?;
    Ok((manager, config))
}

pub fn create_default_config(path: Option<&Path>) -> anyhow::Result<()> {
    let manager = ConfigManager::with_options(options_for(path));
    manager.save(&ThorConfig::default())
}
