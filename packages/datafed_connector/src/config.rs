use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

// config.toml sections ([server], [database], [directory], [catalog]) or env
// vars with DATAFED_CONNECTOR_ prefix and double-underscore nesting, e.g.
// DATAFED_CONNECTOR_CATALOG__URL=http://catalog.internal:61000

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerFileConfig,
    #[serde(default)]
    pub database: DatabaseFileConfig,
    #[serde(default)]
    pub directory: DirectoryFileConfig,
    #[serde(default)]
    pub catalog: CatalogFileConfig,
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

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryFileConfig {
    #[serde(default = "default_directory_url")]
    pub url: String,
}

impl Default for DirectoryFileConfig {
    fn default() -> Self {
        Self {
            url: default_directory_url(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogFileConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
}

impl Default for CatalogFileConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    63000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("datafed-connector.db")
}

fn default_directory_url() -> String {
    "http://127.0.0.1:60000".to_string()
}

fn default_catalog_url() -> String {
    "http://127.0.0.1:61000".to_string()
}

impl FileConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(FileConfig::default()));
        figment = match config_path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment.merge(Toml::file("datafed-connector.toml")),
        };
        figment
            .merge(Env::prefixed("DATAFED_CONNECTOR_").split("__"))
            .extract()
            .context("Failed to load connector configuration")
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
