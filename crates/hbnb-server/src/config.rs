//! Server configuration, read once from `HBNB_*` environment variables

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    File,
    Db,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::File => write!(f, "file"),
            StorageType::Db => write!(f, "db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    pub type_storage: StorageType,
    pub file_path: String,
    pub database_path: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("HBNB"))
    }

    pub fn load(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 5000)?
            .set_default("type_storage", "file")?
            .set_default("file_path", "file.json")?
            .set_default("database_path", "hbnb.db")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("HBNB").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::load(env(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.type_storage, StorageType::File);
        assert_eq!(config.file_path, "file.json");
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::load(env(&[
            ("HBNB_API_HOST", "127.0.0.1"),
            ("HBNB_API_PORT", "5001"),
            ("HBNB_TYPE_STORAGE", "db"),
            ("HBNB_DATABASE_PATH", "/tmp/hbnb.db"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:5001");
        assert_eq!(config.type_storage, StorageType::Db);
        assert_eq!(config.database_path, "/tmp/hbnb.db");
    }

    #[test]
    fn test_invalid_port() {
        assert!(ServerConfig::load(env(&[("HBNB_API_PORT", "not-a-port")])).is_err());
    }
}
