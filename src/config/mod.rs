//! Driver configuration
//!
//! Serial settings plus the two timing tunables, loadable from a TOML file so
//! a bench setup can be checked in next to the firmware. CLI flags override
//! whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::core::transport::SerialConfig;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not read the file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not valid TOML for this schema
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port settings
    pub serial: SerialConfig,
    /// Watchdog window per exchange, in milliseconds
    pub watchdog_ms: u64,
    /// Poll interval, in milliseconds
    pub tick_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            watchdog_ms: 2000,
            tick_ms: 100,
        }
    }
}

impl DriverConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Watchdog window as a [`Duration`].
    pub fn watchdog_window(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    /// Poll interval as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.watchdog_window(), Duration::from_millis(2000));
        assert_eq!(config.tick(), Duration::from_millis(100));
        assert_eq!(config.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "watchdog_ms = 5000\n\n[serial]\nport = \"/dev/ttyUSB1\"\nbaud_rate = 9600"
        )
        .unwrap();

        let config = DriverConfig::load(file.path()).unwrap();
        assert_eq!(config.watchdog_ms, 5000);
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.data_bits, 8);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "watchdog_ms = \"soon\"").unwrap();
        assert!(matches!(
            DriverConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
