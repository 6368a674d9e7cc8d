use display_store::error::{ConfigError, ImportError, InitializationError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MainError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a valid file name")]
    InvalidFileName(PathBuf),
    #[error(transparent)]
    Import(#[from] ImportError),
}
