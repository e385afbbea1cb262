use std::path::PathBuf;
use thiserror::Error;

/// Problems found while loading or validating the run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse configuration {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid parameter `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("grid must have at least one cell per axis, got {nx} x {ny}")]
    EmptyGrid { nx: usize, ny: usize },

    #[error("cell size must be positive and finite, got dx = {dx}, dy = {dy}")]
    BadCellSize { dx: f64, dy: f64 },
}

/// Problems reading an external diffusion coefficient table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("cannot read diffusion table {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("diffusion table {path:?}: value {position} `{token}` is not a number")]
    Parse {
        path: PathBuf,
        position: usize,
        token: String,
    },

    #[error("diffusion table {path:?}: expected {expected} values, found {found}")]
    Truncated {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("failed to build sparse matrix at t = {t}: {reason}")]
    Assembly { t: f64, reason: String },

    #[error("sparse LU factorization failed at t = {t}: {reason}")]
    Factorization { t: f64, reason: String },
}
