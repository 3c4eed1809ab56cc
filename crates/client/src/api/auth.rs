//! Login and logout.

use reqwest::Method;
use saleso_core::{CurrentUser, TokenPair};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::SalesoClient;
use crate::error::GatewayError;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of a successful `POST /auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: CurrentUser,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl SalesoClient {
    /// Sign in and persist the new session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for blank input, the backend's
    /// error for rejected credentials, or a storage error.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, GatewayError> {
        let email = email.trim();
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(GatewayError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self
            .gateway()
            .send_public(Method::POST, "/auth/login", Some(&body))
            .await?;

        let tokens = TokenPair::new(response.access_token, response.refresh_token);
        self.session().store_login(&tokens, &response.user)?;
        info!(user = %response.user.username, role = %response.user.role, "Logged in");

        Ok(response.user)
    }

    /// End the session locally. The theme preference is kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), GatewayError> {
        self.session().clear()?;
        self.invalidate_categories().await;
        info!("Logged out");
        Ok(())
    }
}
