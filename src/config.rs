use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::filter::SortOrder;

/// Board settings, read from `data/board.ron`.
#[derive(Deserialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    /// OAuth2 client-credentials token endpoint.
    pub token_url: Url,
    /// Full job listing.
    pub jobs_url: Url,
    /// Single job; the job id is appended as a path segment.
    pub job_detail_url: Url,
    pub companies_url: Url,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where `fetch` stores the last job list.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

fn default_page_size() -> usize {
    25
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_snapshot_path() -> PathBuf {
    "data/jobs.ron".into()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("page_size must be at least 1")]
    ZeroPageSize,
}

impl BoardConfig {
    pub const PATH: &str = "data/board.ron";

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&config_str, path)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates config text. `path` only labels errors.
    fn parse(config_str: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(config)
    }
}
