use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::readings::{MergePolicy, TopicMap};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TOPIC_AIR_QUALITY,
    DEFAULT_TOPIC_HUMIDITY, DEFAULT_TOPIC_STATUS, DEFAULT_TOPIC_TEMPERATURE,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
}

/// Sensor topic names
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TopicsFileConfig {
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub air_quality: Option<String>,
    pub status: Option<String>,
}

/// Ingestion configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IngestionFileConfig {
    pub merge_policy: Option<MergePolicy>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub file: Option<String>,
}

/// Retention configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RetentionFileConfig {
    pub days: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub topics: Option<TopicsFileConfig>,
    pub ingestion: Option<IngestionFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub retention: Option<RetentionFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
            if server.static_dir.is_some() {
                current.static_dir = server.static_dir;
            }
        }

        if let Some(topics) = other.topics {
            let current = self.topics.get_or_insert_with(TopicsFileConfig::default);
            if topics.temperature.is_some() {
                current.temperature = topics.temperature;
            }
            if topics.humidity.is_some() {
                current.humidity = topics.humidity;
            }
            if topics.air_quality.is_some() {
                current.air_quality = topics.air_quality;
            }
            if topics.status.is_some() {
                current.status = topics.status;
            }
        }

        if let Some(ingestion) = other.ingestion {
            let current = self
                .ingestion
                .get_or_insert_with(IngestionFileConfig::default);
            if ingestion.merge_policy.is_some() {
                tracing::trace!(policy = ?ingestion.merge_policy, "Merging ingestion.merge_policy");
                current.merge_policy = ingestion.merge_policy;
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.file.is_some() {
                current.file = database.file;
            }
        }

        if let Some(retention) = other.retention {
            let current = self
                .retention
                .get_or_insert_with(RetentionFileConfig::default);
            if retention.days.is_some() {
                current.days = retention.days;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub topics: TopicMap,
    pub merge_policy: MergePolicy,
}

/// Database configuration
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Explicit database file; `None` uses the data directory
    pub file: Option<PathBuf>,
}

/// Retention configuration
#[derive(Debug, Clone, Default)]
pub struct RetentionConfig {
    /// Delete readings older than this many days; `None` disables the task
    pub max_age_days: Option<u32>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingestion: IngestionConfig,
    pub database: DatabaseConfig,
    pub retention: RetentionConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.sensorhub/sensorhub.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Ok(Self::from_sources(file_config, cli))
    }

    /// Layer defaults, file config, then CLI/env overrides
    pub fn from_sources(file_config: FileConfig, cli: &CliConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_topics = file_config.topics.unwrap_or_default();
        let file_ingestion = file_config.ingestion.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_retention = file_config.retention.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);
        let static_dir = cli
            .static_dir
            .clone()
            .or_else(|| file_server.static_dir.map(|p| expand_path(&p)));

        let topics = TopicMap {
            temperature: cli
                .topic_temperature
                .clone()
                .or(file_topics.temperature)
                .unwrap_or_else(|| DEFAULT_TOPIC_TEMPERATURE.to_string()),
            humidity: cli
                .topic_humidity
                .clone()
                .or(file_topics.humidity)
                .unwrap_or_else(|| DEFAULT_TOPIC_HUMIDITY.to_string()),
            air_quality: cli
                .topic_air_quality
                .clone()
                .or(file_topics.air_quality)
                .unwrap_or_else(|| DEFAULT_TOPIC_AIR_QUALITY.to_string()),
            status: cli
                .topic_status
                .clone()
                .or(file_topics.status)
                .unwrap_or_else(|| DEFAULT_TOPIC_STATUS.to_string()),
        };

        let merge_policy = cli
            .merge_policy
            .or(file_ingestion.merge_policy)
            .unwrap_or_default();

        let db_file = cli
            .db_file
            .clone()
            .or_else(|| file_database.file.map(|p| expand_path(&p)));

        // 0 disables automatic retention
        let max_age_days = cli
            .retention_days
            .or(file_retention.days)
            .filter(|&d| d > 0);

        Self {
            server: ServerConfig {
                host,
                port,
                static_dir,
            },
            ingestion: IngestionConfig {
                topics,
                merge_policy,
            },
            database: DatabaseConfig { file: db_file },
            retention: RetentionConfig { max_age_days },
        }
    }
}

/// Get profile config path (~/.sensorhub/sensorhub.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080 },
            "topics": { "temperature": "lab/t", "status": "lab/status" },
            "ingestion": { "merge_policy": "reset-after-emit" },
            "retention": { "days": 14 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(8080));

        let topics = config.topics.as_ref().unwrap();
        assert_eq!(topics.temperature.as_deref(), Some("lab/t"));
        assert!(topics.humidity.is_none());

        assert_eq!(
            config.ingestion.as_ref().unwrap().merge_policy,
            Some(MergePolicy::ResetAfterEmit)
        );
        assert_eq!(config.retention.as_ref().unwrap().days, Some(14));
    }

    #[test]
    fn test_file_config_unknown_fields_collected() {
        let json = r#"{ "server": { "port": 9000 }, "mqtt_brokr": "typo" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        let extra = config.extra.as_object().unwrap();
        assert!(extra.contains_key("mqtt_brokr"));
    }

    #[test]
    fn test_merge_other_takes_precedence() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "127.0.0.1", "port": 3000 }, "topics": { "humidity": "a/h" } }"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "server": { "port": 4000 }, "topics": { "humidity": "b/h" } }"#)
                .unwrap();

        base.merge(overlay);

        let server = base.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(4000));
        assert_eq!(base.topics.unwrap().humidity.as_deref(), Some("b/h"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_sources(FileConfig::default(), &CliConfig::default());

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.server.static_dir.is_none());
        assert_eq!(config.ingestion.topics.temperature, DEFAULT_TOPIC_TEMPERATURE);
        assert_eq!(config.ingestion.topics.humidity, DEFAULT_TOPIC_HUMIDITY);
        assert_eq!(config.ingestion.topics.air_quality, DEFAULT_TOPIC_AIR_QUALITY);
        assert_eq!(config.ingestion.topics.status, DEFAULT_TOPIC_STATUS);
        assert_eq!(config.ingestion.merge_policy, MergePolicy::LatestSnapshot);
        assert!(config.database.file.is_none());
        assert!(config.retention.max_age_days.is_none());
    }

    #[test]
    fn test_cli_overrides_file_config() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "server": { "port": 8080 }, "topics": { "temperature": "file/t" }, "retention": { "days": 10 } }"#,
        )
        .unwrap();
        let cli = CliConfig {
            port: Some(9090),
            topic_temperature: Some("cli/t".to_string()),
            merge_policy: Some(MergePolicy::ResetAfterEmit),
            ..Default::default()
        };

        let config = AppConfig::from_sources(file, &cli);
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.ingestion.topics.temperature, "cli/t");
        assert_eq!(config.ingestion.merge_policy, MergePolicy::ResetAfterEmit);
        assert_eq!(config.retention.max_age_days, Some(10));
    }

    #[test]
    fn test_zero_retention_days_disables_task() {
        let cli = CliConfig {
            retention_days: Some(0),
            ..Default::default()
        };
        let config = AppConfig::from_sources(FileConfig::default(), &cli);
        assert!(config.retention.max_age_days.is_none());
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(!is_all_interfaces("127.0.0.1"));
    }
}
