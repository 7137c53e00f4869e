use std::time::Duration;
use std::{env, fmt, fs, path};

use healthcheck::ServiceOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    ParseFailed { path: path::PathBuf, source: toml::de::Error },
    #[error("failed to serialize configuration: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no configuration directory available ($XDG_CONFIG_HOME and $HOME unset)")]
    ConfigPathUnavailable,
    #[error("invalid {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

/// One monitored service; unset tunables fall back to the library defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<u32>,
}

impl ServiceEntry {
    pub fn options(&self) -> ServiceOptions {
        let mut options = ServiceOptions::default();
        if let Some(ms) = self.interval_ms {
            options = options.with_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        if let Some(max_failures) = self.max_failures {
            options = options.with_max_failures(max_failures);
        }
        options
    }
}

impl Default for Server {
    fn default() -> Self {
        let bind = option_env!("DEFAULT_BIND").unwrap_or("0.0.0.0").to_string();
        let port = option_env!("DEFAULT_PORT").and_then(|port| port.parse().ok()).unwrap_or(4000);
        Self { bind, port }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/healthcheck/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    if let Some(baked) = option_env!("DEFAULT_HEALTHCHECK_CONFIG") {
        return Ok(path::PathBuf::from(baked));
    }

    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("healthcheck/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Server: {}:{}", self.server.bind, self.server.port)?;
        writeln!(f, "Services ({}):", self.services.len())?;
        for service in &self.services {
            writeln!(f, "  {} -> {}", service.name, service.url)?;
        }
        Ok(())
    }
}

impl Config {
    /// Load the configuration file
    ///
    /// Uses the given path, or the default location when `None`. A missing
    /// file is created with the default configuration.
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path = match optional_path {
            Some(path) => normalize_toml_path(path.as_ref()),
            None => default_config_path()?,
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(&raw_string)
                .map_err(|source| ConfigError::ParseFailed { path: config_path, source })
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Apply `BIND` / `PORT` from the process environment
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(bind) = env::var("BIND") {
            self.server.bind = bind;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port =
                port.parse().map_err(|_| ConfigError::InvalidEnv { name: "PORT", value: port })?;
        }
        Ok(self)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            [server]
            bind = "127.0.0.1"
            port = 8081

            [[services]]
            name = "api"
            url = "https://example.com/health"
            interval_ms = 1000
            timeout_ms = 250
            max_failures = 5

            [[services]]
            name = "web"
            url = "http://localhost:3000"
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.services.len(), 2);

        let api = config.services[0].options();
        assert_eq!(api.interval, Duration::from_millis(1000));
        assert_eq!(api.timeout, Duration::from_millis(250));
        assert_eq!(api.max_failures, 5);

        // Unset fields keep the library defaults
        assert_eq!(config.services[1].options(), ServiceOptions::default());
    }

    #[test]
    fn test_missing_file_writes_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config::from_config(Some(&path)).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // Reading it back yields the same configuration
        let reloaded = Config::from_config(Some(&path)).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_path_is_normalized_to_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings");

        Config::from_config(Some(&path)).unwrap();
        assert!(dir.path().join("settings.toml").exists());
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[[services]]\nname = 1").unwrap();

        let error = Config::from_config(Some(&path)).unwrap_err();
        assert!(matches!(error, ConfigError::ParseFailed { .. }));
        assert!(error.to_string().contains("broken.toml"));
    }
}
