use super::config::ConfigError;
use crate::core::models::error::ModelError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
