use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::account::FieldLimits;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Ledger behaviour shared by every request.
///
/// `lock_timeout_ms` is process-wide: every store transaction waits at most
/// this long for a row lock before failing with a lock conflict.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    pub lock_timeout_ms: u64,
    pub owner_name_max_len: usize,
    pub comment_max_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 1000,
            owner_name_max_len: 100,
            comment_max_len: 255,
        }
    }
}

impl LedgerConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn field_limits(&self) -> FieldLimits {
        FieldLimits {
            owner_name_max_len: self.owner_name_max_len,
            comment_max_len: self.comment_max_len,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        if config.ledger.lock_timeout_ms == 0 {
            anyhow::bail!("ledger.lock_timeout_ms must be greater than zero");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: "info"
log_dir: "./logs"
log_file: "ledger.log"
use_json: false
rotation: "never"
gateway:
  host: "127.0.0.1"
  port: 8080
"#;

    #[test]
    fn test_ledger_defaults_when_section_missing() {
        let config = AppConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.ledger.lock_timeout_ms, 1000);
        assert_eq!(config.ledger.lock_timeout(), Duration::from_secs(1));
        assert_eq!(config.ledger.field_limits().comment_max_len, 255);
        assert!(config.postgres_url.is_none());
    }

    #[test]
    fn test_ledger_section_overrides() {
        let yaml = format!(
            "{}ledger:\n  lock_timeout_ms: 250\n  owner_name_max_len: 10\n  comment_max_len: 20\npostgres_url: \"postgresql://x@y/z\"\n",
            MINIMAL
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.ledger.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.ledger.field_limits().owner_name_max_len, 10);
        assert_eq!(config.postgres_url.as_deref(), Some("postgresql://x@y/z"));
    }

    #[test]
    fn test_zero_lock_timeout_rejected() {
        let yaml = format!(
            "{}ledger:\n  lock_timeout_ms: 0\n  owner_name_max_len: 10\n  comment_max_len: 20\n",
            MINIMAL
        );
        assert!(AppConfig::from_yaml_str(&yaml).is_err());
    }
}
