//! Config file schema and parsing.
//!
//! YAML files may be a bare list of endpoints:
//!
//! ```yaml
//! - name: fetch index page
//!   url: https://fetch.com/
//!   method: GET
//!   headers:
//!     user-agent: fetch-synthetic-monitor
//! - name: fetch some fake post endpoint
//!   url: https://fetch.com/some/post/endpoint
//!   method: POST
//!   body: '{"foo":"bar"}'
//! ```
//!
//! or, like TOML files, a table with optional settings:
//!
//! ```toml
//! [monitor]
//! interval_secs = 15
//! timeout_ms = 1000
//! latency_threshold_ms = 500
//!
//! [logging]
//! format = "json"
//!
//! [[endpoint]]
//! url = "https://fetch.com/careers"
//! headers = { user-agent = "fetch-synthetic-monitor" }
//! ```

use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use health_core::{EndpointDescriptor, MonitorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default, alias = "endpoints")]
    pub endpoint: Vec<EndpointDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,

    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_ms: default_timeout_ms(),
            latency_threshold_ms: default_latency_threshold_ms(),
            max_cycles: None,
        }
    }
}

fn default_interval_secs() -> u64 {
    15
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_latency_threshold_ms() -> u64 {
    500
}

impl MonitorSettings {
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let mut c = MonitorConfig::default()
            .with_interval_secs(self.interval_secs)
            .with_request_timeout_ms(self.timeout_ms)
            .with_latency_threshold_ms(self.latency_threshold_ms);
        if let Some(n) = self.max_cycles {
            c = c.with_max_cycles(n);
        }
        c
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config = Self::parse(&content, ConfigFormat::from_path(path))
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => {
                let value: serde_yaml::Value =
                    serde_yaml::from_str(content).map_err(|e| e.to_string())?;
                match value {
                    serde_yaml::Value::Null => Ok(Self::default()),
                    serde_yaml::Value::Sequence(_) => {
                        let endpoint: Vec<EndpointDescriptor> =
                            serde_yaml::from_value(value).map_err(|e| e.to_string())?;
                        Ok(Self {
                            endpoint,
                            ..Self::default()
                        })
                    }
                    other => serde_yaml::from_value(other).map_err(|e| e.to_string()),
                }
            }
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("No endpoints to monitor".into());
        }
        for (i, ep) in self.endpoint.iter().enumerate() {
            ep.validate()
                .map_err(|e| format!("Invalid endpoint at index {}: {}", i, e))?;
        }
        if self.monitor.timeout_ms == 0 {
            return Err("timeout_ms must be greater than zero".into());
        }
        if self.monitor.latency_threshold_ms == 0 {
            return Err("latency_threshold_ms must be greater than zero".into());
        }
        if self.monitor.max_cycles == Some(0) {
            return Err("max_cycles must be greater than zero".into());
        }
        Ok(())
    }
}
