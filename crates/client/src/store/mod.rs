//! Client-local key-value storage.
//!
//! The session lives in a small string-to-string store, the same shape a
//! browser's local storage has. [`KeyValueStore`] is the seam the session
//! manager depends on; [`MemoryStore`] and [`FileStore`] are the two
//! backends shipped with the crate.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the JSON-encoded current user.
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Storage key of the theme preference.
pub const THEME_MODE_KEY: &str = "themeMode";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing data is not valid JSON.
    #[error("storage format error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A thread panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key-value storage with no schema.
///
/// Implementations must be safe to share between tasks; every call is
/// short and synchronous.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write several values as one update.
    ///
    /// The default applies [`set`](Self::set) per entry; backends that can
    /// commit a batch at once override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete several values as one update.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
