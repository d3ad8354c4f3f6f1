/*!
 * Device Configuration
 * Mailbox device settings with environment overrides
 */

use crate::core::limits::{DEFAULT_CAPACITY, DEFAULT_DEVICE_NAME, MAX_CAPACITY, MIN_CAPACITY};
use crate::core::types::Size;
use crate::ipc::mailbox::IoMode;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the device name
pub const ENV_DEVICE_NAME: &str = "MAILBOX_DEVICE_NAME";
/// Environment variable overriding the capacity in bytes
pub const ENV_CAPACITY: &str = "MAILBOX_CAPACITY";
/// Environment variable selecting the initial mode (`blocking` / `nonblocking`)
pub const ENV_MODE: &str = "MAILBOX_MODE";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid capacity {value:?}: {reason}")]
    #[diagnostic(
        code(config::invalid_capacity),
        help("Capacity must be an integer number of bytes between 1 and 1048576.")
    )]
    InvalidCapacity { value: String, reason: String },

    #[error("Invalid mode {0:?}")]
    #[diagnostic(
        code(config::invalid_mode),
        help("Use 'blocking' or 'nonblocking'.")
    )]
    InvalidMode(String),

    #[error("Device name must not be empty")]
    #[diagnostic(code(config::empty_name))]
    EmptyName,
}

/// Mailbox device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxConfig {
    pub device_name: String,
    pub capacity: Size,
    pub initial_mode: IoMode,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            capacity: DEFAULT_CAPACITY,
            initial_mode: IoMode::Blocking,
        }
    }
}

impl MailboxConfig {
    pub fn with_capacity(mut self, capacity: Size) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_mode(mut self, mode: IoMode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Defaults overridden by `MAILBOX_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var(ENV_DEVICE_NAME) {
            config.device_name = name;
        }
        if let Ok(raw) = std::env::var(ENV_CAPACITY) {
            config.capacity = raw.trim().parse::<Size>().map_err(|e| {
                ConfigError::InvalidCapacity {
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Ok(raw) = std::env::var(ENV_MODE) {
            config.initial_mode = raw
                .parse()
                .map_err(|_| ConfigError::InvalidMode(raw.clone()))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.capacity) {
            return Err(ConfigError::InvalidCapacity {
                value: self.capacity.to_string(),
                reason: format!("must be within {}..={}", MIN_CAPACITY, MAX_CAPACITY),
            });
        }
        Ok(())
    }
}
