//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `fauxplug.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::net::IpAddr;

use fauxplug_adapter_led::StripConfig;
use fauxplug_adapter_net::{DiscoveryConfig, EmulatorConfig};
use fauxplug_domain::color::{Brightness, Rgb};
use serde::Deserialize;

/// The assistant only ever controls this many switches per emulator.
pub const MAX_DEVICES: usize = 16;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen and advertise addresses.
    pub server: ServerConfig,
    /// Event-loop tuning.
    pub emulator: EmulatorConfig,
    /// SSDP responder settings.
    pub discovery: DiscoveryConfig,
    /// Shared LED strip.
    pub strip: StripConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Emulated switches, in discovery order.
    pub devices: Vec<DeviceConfig>,
}

/// Control listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address every control listener binds to (e.g. `0.0.0.0`).
    pub host: String,
    /// Address put in `LOCATION`. Derived from `host` when absent.
    pub advertise_ip: Option<IpAddr>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One emulated switch.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Name the assistant knows the switch by.
    pub description: String,
    /// Control port; absent or `0` lets the kernel pick one.
    #[serde(default)]
    pub port: Option<toml::Value>,
    /// What toggling the switch does.
    #[serde(default)]
    pub handler: HandlerConfig,
}

/// Action handler selection for one switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Fill the shared strip with `color`.
    LedStrip {
        color: Rgb,
        #[serde(default)]
        brightness: Brightness,
    },
    /// Toggle a single output.
    Indicator,
    /// No handler: `off` succeeds, `on` fails.
    #[default]
    None,
}

impl DeviceConfig {
    /// The control port to bind, `0` meaning "any".
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] when `port` is not an integer
    /// in `0..=65535`.
    pub fn port(&self) -> Result<u16, ConfigError> {
        let Some(value) = &self.port else {
            return Ok(0);
        };
        value
            .as_integer()
            .and_then(|port| u16::try_from(port).ok())
            .ok_or_else(|| ConfigError::InvalidPort {
                kind: value.type_str(),
                value: value.to_string(),
            })
    }
}

impl Config {
    /// Load configuration from `fauxplug.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("fauxplug.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FAUXPLUG_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("FAUXPLUG_ADVERTISE_IP") {
            if let Ok(ip) = val.parse() {
                self.server.advertise_ip = Some(ip);
            }
        }
        if let Ok(val) = std::env::var("FAUXPLUG_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.listen_ip()?;
        if self.devices.len() > MAX_DEVICES {
            return Err(ConfigError::TooManyDevices(self.devices.len()));
        }
        if self.emulator.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be non-zero".to_string(),
            ));
        }
        let mut ports = HashSet::new();
        for device in &self.devices {
            if device.description.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "device description must not be empty".to_string(),
                ));
            }
            let port = device.port()?;
            if port != 0 && !ports.insert(port) {
                return Err(ConfigError::Validation(format!(
                    "port {port} is used by more than one device"
                )));
            }
        }
        Ok(())
    }

    /// Address the control listeners bind to.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `server.host` is not an IP
    /// address.
    pub fn listen_ip(&self) -> Result<IpAddr, ConfigError> {
        self.server.host.parse().map_err(|_| {
            ConfigError::Validation(format!("host {:?} is not an IP address", self.server.host))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            advertise_ip: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "fauxplugd=info,fauxplug=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// A device port that is not an integer in range.
    #[error("invalid device port {value} ({kind}), expected an integer between 0 and 65535")]
    InvalidPort { kind: &'static str, value: String },
    /// More devices than the assistant can control.
    #[error("{0} devices configured, at most 16 are supported")]
    TooManyDevices(usize),
}
