//! Subcommand implementations.
//!
//! Every command works against the file-backed session at
//! `SALESO_SESSION_FILE` and reports session expiry through the log.

pub mod auth;
pub mod catalog;
pub mod request;
pub mod theme;

use std::sync::Arc;

use saleso_client::{
    ClientConfig, ConfigError, FileStore, GatewayError, LogListener, SalesoClient, StoreError,
};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The session file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid command-line input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading stdin or writing stdout failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build a client over the configured session file.
pub fn client() -> Result<SalesoClient, CliError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(
        base_url = %config.api_base_url,
        session_file = %config.session_file.display(),
        "Loaded configuration"
    );

    let store = Arc::new(FileStore::new(&config.session_file));
    Ok(SalesoClient::new(&config, store, Arc::new(LogListener))?)
}
