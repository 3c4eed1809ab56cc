//! Saleso Client - Authenticated HTTP access to the Saleso backend.
//!
//! # Architecture
//!
//! - [`gateway`] - Sends every request with the stored access token and
//!   renews it once when the backend rejects it
//! - [`session`] - Owns credentials, the current user and the theme
//!   preference; runs the single shared credential refresh
//! - [`store`] - Key-value storage backends (in memory, JSON file)
//! - [`api`] - Typed operations per backend resource
//! - [`notice`] - Session-expired notices for the front end
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use saleso_client::{ClientConfig, FileStore, LogListener, SalesoClient};
//!
//! let config = ClientConfig::from_env()?;
//! let store = Arc::new(FileStore::new(&config.session_file));
//! let client = SalesoClient::new(&config, store, Arc::new(LogListener))?;
//!
//! let me = client.user_detail().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod notice;
pub mod session;
pub mod store;

pub use api::{ImageUpload, LoginResponse, SalesoClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{GatewayError, RefreshFailure};
pub use gateway::Gateway;
pub use notice::{LogListener, RecordingListener, SessionExpired, SessionListener};
pub use session::SessionManager;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
