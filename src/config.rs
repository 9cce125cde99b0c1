use serde::{Deserialize, Serialize};
use std::fs;

use anyhow::Context;

use crate::transfer::CoordinatorSettings;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// hourly | daily | never
    pub rotation: String,
    /// Keep per-request debug spans of the transfer module
    #[serde(default)]
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    /// Deep-link prefix placed in notifications
    pub base_url: String,
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// PostgreSQL connection URL; transfers stay in memory when unset
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// Load the demo employees/companies into the in-memory collaborators
    #[serde(default)]
    pub seed_demo_data: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    /// Abort the transition when delivery fails
    #[serde(default)]
    pub required: bool,
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            base_url: self.base_url.clone(),
            notifications_required: self.notifications.required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: transfer.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
base_url: https://hr.example
"#;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert!(!config.notifications.required);
        assert!(config.postgres_url.is_none());
        assert!(!config.seed_demo_data);

        let settings = config.coordinator_settings();
        assert_eq!(settings.base_url, "https://hr.example");
        assert!(!settings.notifications_required);
    }

    #[test]
    fn test_required_notifications() {
        let yaml = format!("{MINIMAL}notifications:\n  required: true\n");
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert!(config.coordinator_settings().notifications_required);
    }

    #[test]
    fn test_missing_file() {
        assert!(AppConfig::load("does-not-exist").is_err());
    }
}
