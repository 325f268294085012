//! Engine configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

pub const DATA_DIR_VAR: &str = "QUESTFORGE_DATA_DIR";
pub const STORE_VAR: &str = "QUESTFORGE_STORE";

const DEFAULT_DATA_DIR: &str = "./data/games";

/// Which game store backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// One JSON file per game under the data directory.
    #[default]
    File,
    /// Process-local map, lost on exit.
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidStore {
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("QUESTFORGE_STORE must be 'file' or 'memory', got '{value}'")]
    InvalidStore { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub store: StoreKind,
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl EngineConfig {
    /// Read the configuration from process environment variables.
    ///
    /// Unset or blank variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let store = match read(STORE_VAR) {
            Some(value) => value.parse()?,
            None => StoreKind::default(),
        };
        let data_dir = read(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Ok(Self { store, data_dir })
    }
}
