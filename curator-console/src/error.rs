use shared::config::ConfigError;
use thiserror::Error;

use crate::routes::RouteTableError;

/// Errors raised while assembling the console.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RouteTableError),

    #[error("at least one backend is required")]
    NoBackends,

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
