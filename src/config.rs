use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::governance::{
    actors, default_grants, default_rules, ActionMonitor, AnomalyRule, AnomalyRuleSet,
    CapabilityRegistry, GrantEntry, JsonlAuditSink, MonitorLimits,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub engagement: EngagementConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Fleet telemetry file (JSON array of vehicle records)
    #[serde(default = "default_fleet_path")]
    pub fleet_path: PathBuf,
}

fn default_fleet_path() -> PathBuf {
    PathBuf::from("data/vehicle_data.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            fleet_path: default_fleet_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Capability grants, one entry per actor
    #[serde(default = "default_grants")]
    pub grants: Vec<GrantEntry>,
    /// Anomaly rules in evaluation order
    #[serde(default = "default_rules")]
    pub rules: Vec<AnomalyRule>,
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: usize,
    #[serde(default = "default_blocked_threshold")]
    pub blocked_threshold: usize,
    /// Number of alerts kept for the security posture view
    #[serde(default = "default_alert_history")]
    pub alert_history: usize,
    /// Append every audit record to this JSONL file
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,
}

fn default_volume_threshold() -> usize {
    MonitorLimits::default().volume_threshold
}

fn default_blocked_threshold() -> usize {
    MonitorLimits::default().blocked_threshold
}

fn default_alert_history() -> usize {
    MonitorLimits::default().alert_history
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            grants: default_grants(),
            rules: default_rules(),
            volume_threshold: default_volume_threshold(),
            blocked_threshold: default_blocked_threshold(),
            alert_history: default_alert_history(),
            audit_log_path: None,
        }
    }
}

impl GovernanceConfig {
    pub fn limits(&self) -> MonitorLimits {
        MonitorLimits {
            volume_threshold: self.volume_threshold,
            blocked_threshold: self.blocked_threshold,
            alert_history: self.alert_history,
        }
    }

    /// Build the action monitor. Fails on incomplete grants or malformed rules.
    pub fn build_monitor(&self) -> Result<ActionMonitor> {
        let registry = CapabilityRegistry::from_entries(&self.grants)?;
        let rules = AnomalyRuleSet::new(self.rules.clone())?;
        let monitor = ActionMonitor::new(registry, rules, self.limits());

        match &self.audit_log_path {
            Some(path) => Ok(monitor.with_sink(Box::new(JsonlAuditSink::open(path)?))),
            None => Ok(monitor),
        }
    }
}

/// Output backend for notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Console,
    Command,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechCommandConfig {
    #[serde(default = "default_speech_program")]
    pub program: String,
    /// Extra arguments placed before rate/volume/text
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_speech_program() -> String {
    "espeak".to_string()
}

impl Default for SpeechCommandConfig {
    fn default() -> Self {
        Self {
            program: default_speech_program(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub command: SpeechCommandConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementConfig {
    /// Fixed seed for the acceptance simulation (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Actors the decision pipeline reports under; each needs a grant
const PIPELINE_ACTORS: [&str; 6] = [
    actors::MASTER_AGENT,
    actors::DATA_AGENT,
    actors::DIAGNOSIS_AGENT,
    actors::MANUFACTURING_AGENT,
    actors::CUSTOMER_AGENT,
    actors::SCHEDULING_AGENT,
];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let env = std::env::var("ROADIQ_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides (e.g., config/production.toml)
            .add_source(File::from(config_dir.join(format!("{env}.toml"))).required(false))
            // ROADIQ__DATA__FLEET_PATH, ROADIQ__NOTIFICATIONS__BACKEND, ...
            .add_source(
                Environment::with_prefix("ROADIQ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.data.fleet_path.as_os_str().is_empty() {
            errors.push("data.fleet_path must not be empty".to_string());
        }

        let gov = &self.governance;
        for actor in PIPELINE_ACTORS {
            if !gov.grants.iter().any(|g| g.actor == actor) {
                errors.push(format!("governance.grants has no entry for {actor}"));
            }
        }
        if let Err(e) = CapabilityRegistry::from_entries(&gov.grants) {
            errors.push(e.to_string());
        }
        if let Err(e) = AnomalyRuleSet::new(gov.rules.clone()) {
            errors.push(e.to_string());
        }
        if gov.volume_threshold == 0 {
            errors.push("governance.volume_threshold must be positive".to_string());
        }
        if gov.blocked_threshold == 0 {
            errors.push("governance.blocked_threshold must be positive".to_string());
        }
        if gov.alert_history == 0 {
            errors.push("governance.alert_history must be positive".to_string());
        }

        if self.notifications.backend == BackendKind::Command
            && self.notifications.command.program.trim().is_empty()
        {
            errors.push("notifications.command.program is required for the command backend".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            errors.push(format!("unknown logging.level '{}'", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
