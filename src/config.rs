//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/moviegraph/config.toml` (XDG) or platform config dir
//! 2. Project config: `.moviegraph.toml`
//! 3. Environment variables: `MOVIEGRAPH_*` (nested keys split on `__`)
//!
//! # Example
//!
//! ```toml
//! [store]
//! backend = "postgres"
//! uri = "postgresql://postgres@localhost:5432/moviegraph"
//! credential = "secret"
//! database = "tmdb"
//! collection = "movies"
//! throughput = 10000
//! partition_key = "/pk"
//!
//! [data]
//! root = "/data/the-movies-dataset"
//!
//! [load]
//! cleanup_on_start = true
//! cleanup_on_finish = false
//! ```
//!
//! Environment overrides use double underscores between section and key,
//! e.g. `MOVIEGRAPH_LOAD__CLEANUP_ON_START=true`.

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

/// Which sink implementation receives the bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    /// PostgreSQL + Apache AGE.
    #[default]
    Postgres,
    /// In-process store, nothing leaves the machine.
    Memory,
}

/// Destination graph store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: SinkBackend,
    /// Endpoint address (connection string for the postgres backend).
    #[serde(default)]
    pub uri: String,
    /// Access credential. Overrides any password embedded in `uri`.
    #[serde(default)]
    pub credential: Option<String>,
    pub database: String,
    pub collection: String,
    /// Provisioned throughput in request units per second.
    #[serde(default = "default_throughput")]
    pub throughput: u32,
    /// Partition key path, e.g. `/pk`.
    #[serde(default = "default_partition_key")]
    pub partition_key: String,
}

fn default_throughput() -> u32 {
    400
}

fn default_partition_key() -> String {
    "/pk".to_string()
}

impl StoreConfig {
    /// Returns the destination graph name: `<database>_<collection>`.
    pub fn graph_name(&self) -> String {
        format!("{}_{}", self.database, self.collection)
    }

    /// Property name the partition key path points at (`/pk` -> `pk`).
    pub fn partition_key_property(&self) -> &str {
        self.partition_key.trim_start_matches('/')
    }
}

/// Source data layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root directory holding the CSV sources and the interchange output.
    pub root: PathBuf,
    /// Ratings file name under `root`.
    #[serde(default = "default_ratings_file")]
    pub ratings_file: String,
    /// MovieLens -> TMDB id link table under `root` (optional on disk).
    #[serde(default = "default_links_file")]
    pub links_file: String,
}

fn default_ratings_file() -> String {
    "ratings_small.csv".to_string()
}

fn default_links_file() -> String {
    "links.csv".to_string()
}

impl DataConfig {
    pub fn source_path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }
}

/// Bulk load behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Drop and recreate the destination collection before loading.
    #[serde(default)]
    pub cleanup_on_start: bool,
    /// Drop the destination collection after loading.
    #[serde(default)]
    pub cleanup_on_finish: bool,
    /// Documents per write request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Write requests in flight at once within a group.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Drop edges whose endpoints were never loaded as vertices.
    #[serde(default = "default_validate_edges")]
    pub validate_edges: bool,
}

fn default_batch_size() -> usize {
    1000
}

fn default_max_concurrency() -> usize {
    4
}

fn default_validate_edges() -> bool {
    true
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            cleanup_on_start: false,
            cleanup_on_finish: false,
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            validate_edges: default_validate_edges(),
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::default("load", LoadConfig::default()))
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".moviegraph.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("MOVIEGRAPH_").split("__"))
    }

    /// User config path: ~/.config/moviegraph/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("moviegraph").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("moviegraph").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_load_project_config_with_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                ".moviegraph.toml",
                r#"
                [store]
                uri = "postgresql://localhost/tmdb"
                database = "tmdb"
                collection = "movies"

                [data]
                root = "/data"
                "#,
            )?;

            let config = Config::load().expect("config should load");
            assert_eq!(config.store.backend, SinkBackend::Postgres);
            assert_eq!(config.store.throughput, 400);
            assert_eq!(config.store.partition_key_property(), "pk");
            assert_eq!(config.store.graph_name(), "tmdb_movies");
            assert_eq!(config.data.ratings_file, "ratings_small.csv");
            assert!(!config.load.cleanup_on_start);
            assert!(config.load.validate_edges);
            assert_eq!(config.load.batch_size, 1000);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file(
                ".moviegraph.toml",
                r#"
                [store]
                backend = "memory"
                database = "tmdb"
                collection = "movies"

                [data]
                root = "/data"

                [load]
                cleanup_on_start = false
                "#,
            )?;
            jail.set_env("MOVIEGRAPH_LOAD__CLEANUP_ON_START", "true");
            jail.set_env("MOVIEGRAPH_STORE__THROUGHPUT", "20000");

            let config = Config::load().expect("config should load");
            assert_eq!(config.store.backend, SinkBackend::Memory);
            assert!(config.load.cleanup_on_start);
            assert_eq!(config.store.throughput, 20000);
            Ok(())
        });
    }
}
