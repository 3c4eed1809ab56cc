//! Profile, password and address operations.

use saleso_core::{Address, AddressId, CurrentUser, NewAddress, UpdateProfile, UserDetail};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;

use super::{SalesoClient, segment};
use crate::error::GatewayError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    old_password: &'a str,
    new_password: &'a str,
}

impl SalesoClient {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn user_detail(&self) -> Result<UserDetail, GatewayError> {
        self.gateway().get("/user/user-detail").await
    }

    /// Update profile fields and refresh the stored user record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when nothing would change, or
    /// the request/storage error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &UpdateProfile) -> Result<UserDetail, GatewayError> {
        if update.username.is_none()
            && update.first_name.is_none()
            && update.last_name.is_none()
            && update.phone.is_none()
        {
            return Err(GatewayError::Validation("no profile fields to update".to_string()));
        }

        let detail: UserDetail = self.gateway().put("/user/update", update).await?;

        // Keep fields the detail record does not carry.
        let stored = self.session().current_user()?;
        let user = merge_user(stored, &detail);
        self.session().set_current_user(&user)?;

        Ok(detail)
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for an empty or unchanged new
    /// password, or the backend's error.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        old_password: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), GatewayError> {
        let old = old_password.expose_secret();
        let new = new_password.expose_secret();
        if new.is_empty() {
            return Err(GatewayError::Validation("new password is empty".to_string()));
        }
        if old == new {
            return Err(GatewayError::Validation(
                "new password must differ from the old one".to_string(),
            ));
        }

        let body = ChangePasswordRequest {
            old_password: old,
            new_password: new,
        };
        let _: IgnoredAny = self.gateway().put("/user/change-password", &body).await?;
        Ok(())
    }

    /// Saved shipping addresses.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, GatewayError> {
        self.gateway().get("/user/address").await
    }

    /// Save a new shipping address.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, address))]
    pub async fn add_address(&self, address: &NewAddress) -> Result<Address, GatewayError> {
        self.gateway().post("/user/address", address).await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: &AddressId) -> Result<(), GatewayError> {
        let path = format!("/user/address/{}", segment(id.as_str()));
        let _: IgnoredAny = self.gateway().delete(&path).await?;
        Ok(())
    }
}

fn merge_user(stored: Option<CurrentUser>, detail: &UserDetail) -> CurrentUser {
    let fresh = detail.to_current_user();
    match stored {
        Some(mut user) if user.id == fresh.id => {
            user.username = fresh.username;
            user.role = fresh.role;
            user.email = fresh.email;
            user
        }
        _ => fresh,
    }
}
