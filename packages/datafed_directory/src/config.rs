use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

// Three equivalent ways to configure:
//
//   config.toml:  [server]
//                 port = 60000
//
//   env var:      DATAFED_DIRECTORY_SERVER__PORT=60000  (double underscore = nesting)
//
//   CLI flags:    --port 60000 (applied on top, see main.rs)

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub database: DatabaseFileConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseFileConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseFileConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    60000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("datafed-directory.db")
}

impl FileConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
        figment = match config_path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file("datafed-directory.toml")),
        };
        figment
            .merge(Env::prefixed("DATAFED_DIRECTORY_").split("__"))
            .extract()
            .context("Failed to load directory configuration")
    }

    pub fn db_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.database.path.display())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.server.host, self.server.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FileConfig::default();
        assert_eq!(config.server.port, 60000);
        assert_eq!(config.bind_addr().unwrap().port(), 60000);
        assert!(config.db_url().starts_with("sqlite://"));
    }
}
