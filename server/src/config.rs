//! # Server Configuration
//!
//! Settings are resolved in three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional YAML file named by `LOAN_TRACKER_CONFIG`
//! 3. the `LOAN_TRACKER_DATA_DIR`, `LOAN_TRACKER_BIND` and
//!    `LOAN_TRACKER_CORS_ORIGIN` environment variables
//!
//! ## YAML Format
//!
//! ```yaml
//! data_dir: "/var/lib/loan_tracker"
//! bind_address: "0.0.0.0:3000"
//! cors_origin: "http://localhost:8080"
//! ```
//!
//! Keys missing from the file keep their defaults.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "LOAN_TRACKER_CONFIG";
pub const DATA_DIR_VAR: &str = "LOAN_TRACKER_DATA_DIR";
pub const BIND_VAR: &str = "LOAN_TRACKER_BIND";
pub const CORS_ORIGIN_VAR: &str = "LOAN_TRACKER_CORS_ORIGIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the CSV and YAML data files
    pub data_dir: PathBuf,
    pub bind_address: String,
    /// Single origin allowed by the CORS layer
    pub cors_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./loan_tracker_data"),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_sources(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration with `lookup` standing in for the environment
    pub fn from_sources<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(data_dir) = lookup(DATA_DIR_VAR) {
            debug!("{} overrides data_dir", DATA_DIR_VAR);
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(bind_address) = lookup(BIND_VAR) {
            debug!("{} overrides bind_address", BIND_VAR);
            config.bind_address = bind_address;
        }
        if let Some(cors_origin) = lookup(CORS_ORIGIN_VAR) {
            debug!("{} overrides cors_origin", CORS_ORIGIN_VAR);
            config.cors_origin = cors_origin;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_sources(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loan_tracker.yaml");
        fs::write(&path, "data_dir: /srv/loans\nbind_address: \"0.0.0.0:4000\"\n").unwrap();

        let config = AppConfig::from_sources(lookup_in(HashMap::from([
            (CONFIG_PATH_VAR, path.display().to_string()),
            (BIND_VAR, "127.0.0.1:5000".to_string()),
        ])))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/loans"));
        // Environment beats the file
        assert_eq!(config.bind_address, "127.0.0.1:5000");
        // Missing key keeps its default
        assert_eq!(config.cors_origin, "http://localhost:8080");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let result = AppConfig::from_sources(lookup_in(HashMap::from([(
            CONFIG_PATH_VAR,
            "/nonexistent/loan_tracker.yaml".to_string(),
        )])));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_bind_address() {
        let config = AppConfig {
            bind_address: "not-an-address".to_string(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
