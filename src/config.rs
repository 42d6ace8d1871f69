use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file holding the studio data. `~/` is expanded.
    database: String,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `info,sqlx=warn`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint; spans are only exported when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.local/share/studio-manager/studio.db".to_string(),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("studio-manager").join("config.toml"))
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file has been written yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("No config directory on this platform")?;

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Writes the default config unless one already exists. Returns its path.
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or_eyre("No config directory on this platform")?;

        if config_path.exists() {
            tracing::info!("Config already exists at {}", config_path.display());
            return Ok(config_path);
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }

        let contents =
            toml::to_string_pretty(&Self::default()).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context(format!(
            "Failed to write config file: {}",
            config_path.display()
        ))?;

        Ok(config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn database_path(&self) -> PathBuf {
        Self::expand_path(&self.database)
    }

    pub fn port(&self) -> u16 {
        self.server.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.server.port = port;
    }

    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fills_defaults() {
        let config = Config::parse(r#"database = "/srv/studio.db""#).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/srv/studio.db"));
        assert_eq!(config.port(), 3000);
        assert_eq!(config.telemetry().log_level, "info");
        assert!(config.telemetry().otlp_endpoint.is_none());
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(
            r#"
            database = "studio.db"

            [server]
            port = 8080

            [telemetry]
            log_level = "debug,sqlx=warn"
            otlp_endpoint = "http://localhost:4317"
            "#,
        )
        .unwrap();
        assert_eq!(config.port(), 8080);
        assert_eq!(config.telemetry().log_level, "debug,sqlx=warn");
        assert_eq!(
            config.telemetry().otlp_endpoint.as_deref(),
            Some("http://localhost:4317")
        );
    }

    #[test]
    fn test_database_path_expands_home() {
        let config = Config::default();
        let path = config.database_path();
        if let Some(home) = dirs::home_dir() {
            assert!(path.starts_with(home));
        }
        assert!(path.ends_with("studio-manager/studio.db"));
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let written = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(Config::parse(&written).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_database_is_an_error() {
        assert!(Config::parse("[server]\nport = 1").is_err());
    }
}
