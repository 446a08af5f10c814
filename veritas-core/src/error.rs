use thiserror::Error;

use crate::provider::UpstreamError;

#[derive(Error, Debug)]
pub enum VeritasError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}
