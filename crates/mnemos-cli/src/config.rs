//! Configuration
//!
//! Resolution order for the deck path: `--deck`, `MNEMOS_DECK`, the config
//! file's `deck` entry, then the platform data directory. The config file
//! itself comes from `--config`, `MNEMOS_CONFIG`, or `config.json` in the
//! platform config directory when present. `MNEMOS_DESIRED_RETENTION`
//! overrides the desired retention from the file.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use mnemos_core::{ElapsedPolicy, FSRSParameters, FSRSScheduler, SchedulerError};
use serde::Deserialize;
use tracing::debug;

pub const ENV_DECK: &str = "MNEMOS_DECK";
pub const ENV_CONFIG: &str = "MNEMOS_CONFIG";
pub const ENV_DESIRED_RETENTION: &str = "MNEMOS_DESIRED_RETENTION";

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
    #[error(transparent)]
    Parameters(#[from] SchedulerError),
    #[error("Could not determine project directories")]
    NoProjectDirs,
}

/// On-disk config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    deck: Option<PathBuf>,
    parameters: FSRSParameters,
    elapsed_policy: ElapsedPolicy,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub deck_path: PathBuf,
    pub parameters: FSRSParameters,
    pub elapsed_policy: ElapsedPolicy,
}

impl Config {
    /// Resolve configuration from flags, the process environment and files
    pub fn load(deck: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve(deck, config, |var| std::env::var(var).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve<F>(deck: Option<PathBuf>, config: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = match config.or_else(|| env(ENV_CONFIG).map(PathBuf::from)) {
            Some(path) => Some(path),
            None => default_config_path().filter(|p| p.exists()),
        };

        let file = match &config_path {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };

        let mut parameters = file.parameters;
        if let Some(raw) = env(ENV_DESIRED_RETENTION) {
            parameters.desired_retention =
                raw.trim().parse::<f64>().map_err(|_| ConfigError::Env {
                    var: ENV_DESIRED_RETENTION,
                    value: raw.clone(),
                })?;
        }
        parameters.validate()?;

        let deck_path = match deck
            .or_else(|| env(ENV_DECK).map(PathBuf::from))
            .or(file.deck)
        {
            Some(path) => path,
            None => default_deck_path()?,
        };

        debug!(
            deck = %deck_path.display(),
            config = ?config_path,
            desired_retention = parameters.desired_retention,
            "Resolved configuration"
        );

        Ok(Self {
            deck_path,
            parameters,
            elapsed_policy: file.elapsed_policy,
        })
    }

    /// Build the scheduling engine for this configuration
    pub fn scheduler(&self) -> Result<FSRSScheduler, ConfigError> {
        Ok(FSRSScheduler::new(self.parameters.clone())?.with_elapsed_policy(self.elapsed_policy))
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mnemos", "mnemos")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
}

fn default_deck_path() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("deck.json"))
        .ok_or(ConfigError::NoProjectDirs)
}
