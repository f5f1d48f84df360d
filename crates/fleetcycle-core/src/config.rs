//! cycle.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CycleError, CycleResult};

pub const DEFAULT_DOCUMENT: &str = "AWS-RunShellScript";
pub const DEFAULT_EXECUTION_TIMEOUT: &str = "600";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub region: String,
    /// Balancer names. Each is looked up as a classic balancer and as the
    /// owner of a target group; names that resolve to neither are skipped.
    pub balancers: Vec<String>,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub run_timeout: String,
    pub api_timeout: String,
    pub cool_down: String,
    pub stabilization: String,
    pub poll_interval: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            run_timeout: "2h".to_string(),
            api_timeout: "30s".to_string(),
            cool_down: "60s".to_string(),
            stabilization: "60s".to_string(),
            poll_interval: "15s".to_string(),
        }
    }
}

/// Parsed timing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub run_timeout: Duration,
    pub api_timeout: Duration,
    pub cool_down: Duration,
    pub stabilization: Duration,
    pub poll_interval: Duration,
}

impl TimingConfig {
    pub fn resolve(&self) -> CycleResult<Timings> {
        Ok(Timings {
            run_timeout: required_duration("run_timeout", &self.run_timeout)?,
            api_timeout: required_duration("api_timeout", &self.api_timeout)?,
            cool_down: required_duration("cool_down", &self.cool_down)?,
            stabilization: required_duration("stabilization", &self.stabilization)?,
            poll_interval: required_duration("poll_interval", &self.poll_interval)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum MaintenanceConfig {
    /// Stop and start each instance.
    Reboot,
    /// Run a command document on each instance and wait for its result.
    RemoteCommand {
        #[serde(default = "default_document")]
        document: String,
        command: String,
        #[serde(default = "default_execution_timeout")]
        execution_timeout: String,
    },
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        MaintenanceConfig::Reboot
    }
}

fn default_document() -> String {
    DEFAULT_DOCUMENT.to_string()
}

fn default_execution_timeout() -> String {
    DEFAULT_EXECUTION_TIMEOUT.to_string()
}

impl RunConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a reboot-mode config for the given balancers.
    pub fn scaffold(region: &str, balancers: &[String]) -> Self {
        RunConfig {
            region: region.to_string(),
            balancers: balancers.to_vec(),
            timing: TimingConfig::default(),
            maintenance: MaintenanceConfig::Reboot,
        }
    }

    /// Check the config is runnable and return the parsed timings.
    pub fn validate(&self) -> CycleResult<Timings> {
        if self.region.trim().is_empty() {
            return Err(CycleError::Config("region must not be empty".into()));
        }
        if self.balancers.is_empty() {
            return Err(CycleError::Config("at least one balancer is required".into()));
        }
        if let Some(blank) = self.balancers.iter().find(|b| b.trim().is_empty()) {
            return Err(CycleError::Config(format!("blank balancer name {blank:?}")));
        }
        if let MaintenanceConfig::RemoteCommand {
            document, command, ..
        } = &self.maintenance
        {
            if document.trim().is_empty() {
                return Err(CycleError::Config("remote-command document is empty".into()));
            }
            if command.trim().is_empty() {
                return Err(CycleError::Config("remote-command body is empty".into()));
            }
        }

        let timings = self.timing.resolve()?;
        if timings.run_timeout.is_zero() {
            return Err(CycleError::Config("run_timeout must be positive".into()));
        }
        if timings.poll_interval.is_zero() {
            return Err(CycleError::Config("poll_interval must be positive".into()));
        }
        Ok(timings)
    }
}

fn required_duration(field: &str, value: &str) -> CycleResult<Duration> {
    parse_duration(value)
        .ok_or_else(|| CycleError::Config(format!("{field}: cannot parse duration {value:?}")))
}

/// Parse a duration string like "500ms", "5s", "2m", "1h". Bare numbers are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>().ok().map(|h| Duration::from_secs(h * 3600))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
