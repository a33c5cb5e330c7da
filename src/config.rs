//! Runtime settings
//!
//! Settings come from built-in defaults, an optional TOML file, and then
//! `TPW_`-prefixed environment variables using `__` between nested keys
//! (for example `TPW_WATCHER__INTERFACE=wlan0`). Command line flags override
//! whatever is loaded here.

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::collectors::counters::{
    DEFAULT_COUNTER_COMMAND, DEFAULT_FAILURE_WARN_THRESHOLD, WatcherConfig,
};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TPW";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub watcher: WatcherSettings,
    pub bandwidth: BandwidthSettings,
}

/// Counter watcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub interface: String,
    pub interval_secs: u64,
    pub timestamp: bool,
    /// Counter table read by the local connection
    pub counter_path: String,
    pub failure_warn_threshold: u32,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            interface: "eth0".to_string(),
            interval_secs: 1,
            timestamp: false,
            counter_path: "/proc/net/dev".to_string(),
            failure_warn_threshold: DEFAULT_FAILURE_WARN_THRESHOLD,
        }
    }
}

impl WatcherSettings {
    /// Command that prints the configured counter table
    pub fn counter_command(&self) -> String {
        if self.counter_path == "/proc/net/dev" {
            DEFAULT_COUNTER_COMMAND.to_string()
        } else {
            format!("cat {}", shell_quote(&self.counter_path))
        }
    }

    pub fn to_watcher_config(&self) -> WatcherConfig {
        WatcherConfig::new(self.interface.clone())
            .with_interval(Duration::from_secs(self.interval_secs.max(1)))
            .with_command(self.counter_command())
            .with_timestamp(self.timestamp)
            .with_failure_warn_threshold(self.failure_warn_threshold)
    }
}

/// Single-quotes `text` for `sh -c`, escaping embedded single quotes
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// Bandwidth parsing settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthSettings {
    /// Reporting interval of the bandwidth test; learned from the input when unset
    pub interval_secs: Option<f64>,
}

impl Settings {
    /// Loads settings from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.watcher.interface, "eth0");
        assert_eq!(settings.watcher.interval_secs, 1);
        assert_eq!(settings.watcher.counter_command(), DEFAULT_COUNTER_COMMAND);
        assert_eq!(settings.bandwidth.interval_secs, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[watcher]\ninterface = \"wlan0-mon\"\ninterval_secs = 5\ntimestamp = true\n\n[bandwidth]\ninterval_secs = 0.5"
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.watcher.interface, "wlan0-mon");
        assert_eq!(settings.watcher.interval_secs, 5);
        assert!(settings.watcher.timestamp);
        // Unset keys keep their defaults
        assert_eq!(settings.watcher.counter_path, "/proc/net/dev");
        assert_eq!(settings.bandwidth.interval_secs, Some(0.5));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/tw.toml"))).is_err());
    }

    #[test]
    fn test_counter_path_is_quoted_for_the_shell() {
        let settings = WatcherSettings {
            counter_path: "/tmp/net dev/it's; rm -rf x".to_string(),
            ..WatcherSettings::default()
        };
        assert_eq!(
            settings.counter_command(),
            "cat '/tmp/net dev/it'\\''s; rm -rf x'"
        );
    }

    #[test]
    fn test_watcher_config_conversion() {
        let settings = WatcherSettings {
            interface: "wlan0".to_string(),
            interval_secs: 0,
            timestamp: true,
            counter_path: "/tmp/dev".to_string(),
            failure_warn_threshold: 5,
        };
        let config = settings.to_watcher_config();
        assert_eq!(config.interface, "wlan0");
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.command, "cat '/tmp/dev'");
        assert!(config.timestamp);
        assert_eq!(config.failure_warn_threshold, 5);
    }
}
