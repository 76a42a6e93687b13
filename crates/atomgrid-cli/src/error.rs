use atomgrid::core::models::error::ModelError;
use atomgrid::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write file '{path}': {source}", path = path.display())]
    FileWriting {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gradient check failed: max deviation {max_abs_error:.3e} exceeds tolerance {tolerance:.3e}")]
    GradientCheck { max_abs_error: f64, tolerance: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
