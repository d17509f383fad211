// Configuration module
use prahari_gate::GateConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use prahari_commons::TableName;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string for the read-only Postgres role
    pub url: String,
    #[serde(default = "default_db_schema")]
    pub schema: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Per-query execution bound, applied client- and server-side
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

/// Safety gate limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,
}

/// Schema registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Tables the assistant may query. Discovered tables outside this list
    /// never enter the allow-list.
    #[serde(default)]
    pub allowed_tables: Vec<String>,
    #[serde(default = "default_schema_cache_ttl")]
    pub schema_cache_ttl_minutes: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            max_query_length: default_max_query_length(),
            max_rows: default_max_rows(),
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            allowed_tables: Vec::new(),
            schema_cache_ttl_minutes: default_schema_cache_ttl(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_db_schema() -> String {
    "public".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_statement_timeout() -> u64 {
    30
}

fn default_max_query_length() -> usize {
    2000
}

fn default_max_rows() -> u64 {
    200
}

fn default_schema_cache_ttl() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl RegistrySettings {
    /// Normalized configured allow-list.
    pub fn table_names(&self) -> BTreeSet<TableName> {
        self.allowed_tables.iter().map(TableName::new).collect()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides for sensitive configuration.
    ///
    /// Supported:
    /// - PRAHARI_DATABASE_URL: override database.url
    /// - DATABASE_URL: override database.url (conventional fallback)
    /// - PRAHARI_LOG_LEVEL: override logging.level
    /// - PRAHARI_SCHEMA_CACHE_TTL_MINUTES: override registry TTL
    fn apply_env_overrides(&mut self) {
        use std::env;

        if let Ok(url) = env::var("PRAHARI_DATABASE_URL") {
            self.database.url = url;
        } else if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(level) = env::var("PRAHARI_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(ttl) = env::var("PRAHARI_SCHEMA_CACHE_TTL_MINUTES") {
            if let Ok(minutes) = ttl.parse() {
                self.registry.schema_cache_ttl_minutes = minutes;
            }
        }
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            return Err(anyhow::anyhow!("database.url cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("database.max_connections cannot be 0"));
        }

        if self.database.statement_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "database.statement_timeout_secs cannot be 0"
            ));
        }

        if self.gate.max_query_length == 0 {
            return Err(anyhow::anyhow!("gate.max_query_length cannot be 0"));
        }

        if self.gate.max_rows == 0 {
            return Err(anyhow::anyhow!("gate.max_rows cannot be 0"));
        }

        if self.registry.schema_cache_ttl_minutes == 0 {
            return Err(anyhow::anyhow!(
                "registry.schema_cache_ttl_minutes cannot be 0"
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        Ok(())
    }

    /// Build the immutable gate config from the loaded settings.
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new(
            self.gate.max_query_length,
            self.gate.max_rows,
            Duration::from_secs(self.registry.schema_cache_ttl_minutes * 60),
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database: DatabaseSettings {
                url: "postgres://localhost:5432/postgres".to_string(),
                schema: default_db_schema(),
                max_connections: default_max_connections(),
                statement_timeout_secs: default_statement_timeout(),
            },
            gate: GateSettings::default(),
            registry: RegistrySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = AppConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_rows_rejected() {
        let mut config = AppConfig::default();
        config.gate.max_rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gate_config_mirrors_settings() {
        let mut config = AppConfig::default();
        config.gate.max_query_length = 1500;
        config.gate.max_rows = 100;
        config.registry.schema_cache_ttl_minutes = 2;

        let gate = config.gate_config();
        assert_eq!(gate.max_query_length, 1500);
        assert_eq!(gate.max_rows, 100);
        assert_eq!(gate.schema_cache_ttl, Duration::from_secs(120));
    }

    #[test]
    fn test_env_override_database_url() {
        env::set_var("PRAHARI_DATABASE_URL", "postgres://ro:pw@db:5432/app");
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        assert_eq!(config.database.url, "postgres://ro:pw@db:5432/app");
        env::remove_var("PRAHARI_DATABASE_URL");
    }

    #[test]
    fn test_registry_table_names_normalized() {
        let mut config = AppConfig::default();
        config.registry.allowed_tables =
            vec!["public.Users".to_string(), "checklist".to_string()];
        let names = config.registry.table_names();
        assert!(names.contains(&TableName::new("users")));
        assert!(names.contains(&TableName::new("checklist")));
    }
}
