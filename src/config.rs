//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, UmbError};
use crate::serial::port_trait::IdleTimeout;
use crate::serial::RetryPolicy;
use crate::umb::channels;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    pub station: StationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Seconds to keep retrying while the port is absent
    #[serde(default = "default_connect_wait_s")]
    pub connect_wait_s: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    /// Line silence that ends a response
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

/// Station and polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    #[serde(default = "default_receiver_id")]
    pub receiver_id: u8,

    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: u64,

    pub channels: Vec<ChannelConfig>,
}

/// One polled measurement channel
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub channel: u16,

    /// Record key; defaults to the well-known channel name
    #[serde(default)]
    pub name: Option<String>,

    /// Round persisted values to this many decimal places
    #[serde(default)]
    pub decimals: Option<u32>,

    /// Poll only on every n-th cycle
    #[serde(default = "default_every")]
    pub every: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_serial_port() -> String { crate::serial::DEFAULT_DEVICE_PATH.to_string() }
fn default_baud_rate() -> u32 { crate::serial::UMB_DEFAULT_BAUD_RATE }
fn default_connect_wait_s() -> u64 { 10 }
fn default_retry_interval_ms() -> u64 { 1000 }
fn default_idle_timeout_ms() -> u64 { 1000 }
fn default_idle_poll_ms() -> u64 { 10 }

fn default_receiver_id() -> u8 { 1 }
fn default_poll_interval_s() -> u64 { 60 }
fn default_every() -> u32 { 1 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            connect_wait_s: default_connect_wait_s(),
            retry_interval_ms: default_retry_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            idle_poll_ms: default_idle_poll_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl SerialConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.connect_wait_s),
            Duration::from_millis(self.retry_interval_ms),
        )
    }

    pub fn idle_timeout(&self) -> IdleTimeout {
        IdleTimeout::new(
            Duration::from_millis(self.idle_timeout_ms),
            Duration::from_millis(self.idle_poll_ms),
        )
    }
}

impl ChannelConfig {
    /// Record key: configured name, else the well-known name, else `channel_<n>`
    pub fn display_name(&self) -> String {
        match (&self.name, channels::lookup(self.channel)) {
            (Some(name), _) => name.clone(),
            (None, Some(info)) => info.name.to_string(),
            (None, None) => format!("channel_{}", self.channel),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> UmbError {
    UmbError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use umb_station::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate serial port configuration
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![1200, 2400, 4800, 9600, 14400, 19200, 28800, 57600].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 1200, 2400, 4800, 9600, 14400, 19200, 28800, 57600",
            ));
        }

        if self.serial.connect_wait_s > 3600 {
            return Err(invalid("connect_wait_s must be at most 3600"));
        }

        if self.serial.retry_interval_ms == 0 || self.serial.retry_interval_ms > 60000 {
            return Err(invalid("retry_interval_ms must be between 1 and 60000"));
        }

        if self.serial.idle_timeout_ms == 0 || self.serial.idle_timeout_ms > 10000 {
            return Err(invalid("idle_timeout_ms must be between 1 and 10000"));
        }

        if self.serial.idle_poll_ms == 0 || self.serial.idle_poll_ms > self.serial.idle_timeout_ms {
            return Err(invalid("idle_poll_ms must be between 1 and idle_timeout_ms"));
        }

        // Validate station configuration
        if self.station.poll_interval_s == 0 || self.station.poll_interval_s > 86400 {
            return Err(invalid("poll_interval_s must be between 1 and 86400"));
        }

        if self.station.channels.is_empty() {
            return Err(invalid("station must poll at least one channel"));
        }

        let mut names = std::collections::HashSet::new();
        for channel in &self.station.channels {
            if !channels::is_valid_channel(channel.channel) {
                return Err(invalid(format!(
                    "channel {} is out of range (must be {}-{})",
                    channel.channel,
                    channels::CHANNEL_MIN,
                    channels::CHANNEL_MAX
                )));
            }

            if channel.every == 0 {
                return Err(invalid(format!("channel {}: every must be greater than 0", channel.channel)));
            }

            if channel.decimals.is_some_and(|decimals| decimals > 6) {
                return Err(invalid(format!("channel {}: decimals must be at most 6", channel.channel)));
            }

            let name = channel.display_name();
            if !names.insert(name.clone()) {
                return Err(invalid(format!("duplicate channel name '{}'", name)));
            }
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(channel: u16) -> ChannelConfig {
        ChannelConfig {
            channel,
            name: None,
            decimals: Some(2),
            every: default_every(),
        }
    }

    fn default_config() -> Config {
        Config {
            serial: SerialConfig::default(),
            station: StationConfig {
                receiver_id: default_receiver_id(),
                poll_interval_s: default_poll_interval_s(),
                channels: vec![channel(100), channel(200), channel(300)],
            },
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud_rate, 19200);
        assert_eq!(config.serial.retry_policy().attempts(), 11);
        assert_eq!(config.serial.idle_timeout(), IdleTimeout::default());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = default_config();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_idle_poll() {
        let mut config = default_config();
        config.serial.idle_poll_ms = 2000;
        assert!(config.validate().is_err());

        config.serial.idle_poll_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut config = default_config();
        config.station.channels.push(channel(30000));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel 30000 is out of range"));
    }

    #[test]
    fn test_channel_every_zero() {
        let mut config = default_config();
        config.station.channels[0].every = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_channel_names() {
        let mut config = default_config();
        config.station.channels.push(ChannelConfig {
            channel: 105,
            name: Some("air_temperature".to_string()),
            decimals: None,
            every: 1,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate channel name"));
    }

    #[test]
    fn test_no_channels() {
        let mut config = default_config();
        config.station.channels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(channel(100).display_name(), "air_temperature");
        assert_eq!(channel(4630).display_name(), "channel_4630");

        let named = ChannelConfig {
            name: Some("Temperatur".to_string()),
            ..channel(100)
        };
        assert_eq!(named.display_name(), "Temperatur");
    }

    #[test]
    fn test_receiver_id_out_of_range_rejected_by_parser() {
        let toml_content = r#"
[station]
receiver_id = 300
channels = [{ channel = 100 }]
"#;
        assert!(matches!(Config::from_toml(toml_content), Err(UmbError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB1"
idle_timeout_ms = 500

[station]
receiver_id = 2
poll_interval_s = 10

[[station.channels]]
channel = 100
decimals = 2

[[station.channels]]
channel = 800
every = 6

[telemetry]
enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 19200);
        assert_eq!(config.serial.idle_timeout_ms, 500);
        assert_eq!(config.station.receiver_id, 2);
        assert_eq!(config.station.channels.len(), 2);
        assert_eq!(config.station.channels[0].decimals, Some(2));
        assert_eq!(config.station.channels[1].every, 6);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.telemetry.format, "jsonl");
    }

    #[test]
    fn test_load_shipped_default_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.station.receiver_id, 1);
        assert!(!config.station.channels.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/umb-station.toml");
        assert!(matches!(result, Err(UmbError::Io(_))));
    }
}
