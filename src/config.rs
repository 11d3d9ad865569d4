use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Owner recorded on uploads when the caller supplies none
    #[serde(default = "default_owner")]
    pub default_owner: String,
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_description")]
    pub description: String,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "data/filevault.db".to_string()
}

fn default_upload_path() -> String {
    "data/uploads".to_string()
}

fn default_owner() -> String {
    "system".to_string()
}

fn default_service_name() -> String {
    "filevault".to_string()
}

fn default_service_description() -> String {
    "File upload and metadata service".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_path: default_upload_path(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
            name: default_service_name(),
            description: default_service_description(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        Ok(config)
    }

    /// Load configuration from conf.toml or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["conf.toml", "config.toml", "data/conf.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: FV_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("FV_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("FV_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("FV_CONF_DATABASE_PATH") {
            self.database.path = val;
        }
        if let Ok(val) = env::var("FV_CONF_STORAGE_UPLOAD_PATH") {
            self.storage.upload_path = val;
        }
        if let Ok(val) = env::var("FV_CONF_SERVICE_DEFAULT_OWNER") {
            if !val.trim().is_empty() {
                self.service.default_owner = val;
            }
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        // Ensure database directory exists
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        // Ensure upload root exists
        fs::create_dir_all(&self.storage.upload_path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.service.default_owner, "system");
        assert_eq!(config.storage.upload_path, "data/uploads");
    }

    #[test]
    fn service_section_parses() {
        let config: Config =
            toml::from_str("[service]\ndefault_owner = \"ops\"\nname = \"vault\"\n").unwrap();
        assert_eq!(config.service.default_owner, "ops");
        assert_eq!(config.service.name, "vault");
    }
}
