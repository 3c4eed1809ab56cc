//! Typed Saleso backend API.
//!
//! [`SalesoClient`] wraps a [`Gateway`] and exposes one method per backend
//! operation. Resource groups live in their own modules, each adding an
//! `impl SalesoClient` block:
//!
//! - `auth` - Login and logout
//! - `users` - Profile, password, addresses
//! - `catalog` - Categories (cached), products, product images
//! - `discounts` - Discount codes
//! - `checkout` - Multi-seller checkout relay

mod auth;
mod catalog;
mod checkout;
mod discounts;
mod users;

pub use auth::LoginResponse;
pub use catalog::{ImageUpload, MAX_IMAGE_BYTES};

use std::sync::Arc;

use moka::future::Cache;
use saleso_core::catalog::CategoryTree;

use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::notice::SessionListener;
use crate::session::SessionManager;
use crate::store::KeyValueStore;

const CATEGORY_TREE_KEY: &str = "category-tree";

/// Client for the Saleso backend.
///
/// Cheap to clone; clones share the gateway, the session and the category
/// cache.
#[derive(Clone)]
pub struct SalesoClient {
    inner: Arc<SalesoClientInner>,
}

struct SalesoClientInner {
    gateway: Gateway,
    categories: Cache<&'static str, Arc<CategoryTree>>,
}

impl SalesoClient {
    /// Create a client from configuration, a session store and a listener
    /// for session-expired notices.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Self, GatewayError> {
        let gateway = Gateway::new(config, store, listener)?;
        Ok(Self::from_gateway(gateway, config))
    }

    /// Wrap an existing gateway.
    #[must_use]
    pub fn from_gateway(gateway: Gateway, config: &ClientConfig) -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.category_cache_ttl)
            .build();

        Self {
            inner: Arc::new(SalesoClientInner {
                gateway,
                categories,
            }),
        }
    }

    /// The underlying gateway, for endpoints without a typed wrapper.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    /// The session shared with the gateway.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        self.inner.gateway.session()
    }

    /// Drop the cached category tree.
    pub async fn invalidate_categories(&self) {
        self.inner.categories.invalidate(CATEGORY_TREE_KEY).await;
    }
}

impl std::fmt::Debug for SalesoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesoClient")
            .field("gateway", &self.inner.gateway)
            .finish_non_exhaustive()
    }
}

/// Percent-encode an id for use as a single path segment.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
