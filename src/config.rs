// Defaults, endpoint path, drive configuration
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

// Servo pulse widths (microseconds)
pub const SERVO_CENTRE: u16 = 1500;
pub const SERVO_RANGE: u16 = 500;

// Minimum gap between two move commands (~4Hz cap)
pub const MIN_COMMAND_INTERVAL: Duration = Duration::from_millis(250);

// HTTP request timeout for a single command POST
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

// Rover controller
pub const CONTROLLER_URL: &str = "http://127.0.0.1:8080/";
pub const COMMAND_PATH: &str = "./command/"; // relative to the controller url

// Terminal event poll period
pub const INPUT_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Servo range {range} does not fit around centre {centre}")]
    ServoBounds { centre: u16, range: u16 },

    #[error("Command interval must be non-zero")]
    ZeroInterval,

    #[error("Invalid controller url {url:?}: {reason}")]
    ControllerUrl { url: String, reason: String },
}

/// Drive configuration shared by the translator and the command link
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub centre: u16,
    pub range: u16,
    #[serde(deserialize_with = "millis::deserialize")]
    pub min_interval: Duration,
    #[serde(deserialize_with = "millis::deserialize")]
    pub request_timeout: Duration,
    pub controller_url: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            centre: SERVO_CENTRE,
            range: SERVO_RANGE,
            min_interval: MIN_COMMAND_INTERVAL,
            request_timeout: REQUEST_TIMEOUT,
            controller_url: CONTROLLER_URL.to_string(),
        }
    }
}

impl DriveConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.range > self.centre || self.centre.checked_add(self.range).is_none() {
            return Err(ConfigError::ServoBounds {
                centre: self.centre,
                range: self.range,
            });
        }
        if self.min_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        self.command_url().map(|_| ())
    }

    /// Lowest pulse width a wheel may be driven to
    pub fn servo_min(&self) -> u16 {
        self.centre - self.range
    }

    pub fn servo_max(&self) -> u16 {
        self.centre + self.range
    }

    /// Absolute command endpoint: controller url joined with `./command/`
    pub fn command_url(&self) -> Result<reqwest::Url, ConfigError> {
        let invalid = |reason: String| ConfigError::ControllerUrl {
            url: self.controller_url.clone(),
            reason,
        };
        let base = reqwest::Url::parse(&self.controller_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a base url".to_string()));
        }
        base.join(COMMAND_PATH).map_err(|e| invalid(e.to_string()))
    }
}

// Durations are written as integer milliseconds in config files
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
