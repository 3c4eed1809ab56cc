//! Account records.

use serde::{Deserialize, Serialize};

use super::{AddressId, UserId, UserRole};

/// The logged-in account, persisted next to the credentials.
///
/// Fields the client does not model are kept in `extra` so the record can be
/// written back to storage without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of `GET /user/user-detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserDetail {
    /// Collapse the detail record into the shape stored for the session.
    #[must_use]
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            email: Some(self.email.clone()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Profile fields a user may change.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(alias = "_id")]
    pub id: AddressId,
    pub full_name: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Input for creating an address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_default: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_keeps_unknown_fields() {
        let json = serde_json::json!({
            "_id": "u1",
            "username": "ana",
            "role": "seller",
            "storeName": "Ana's Shop"
        });

        let user: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, UserRole::Seller);
        assert_eq!(user.email, None);
        assert_eq!(user.extra["storeName"], "Ana's Shop");

        let written = serde_json::to_value(&user).unwrap();
        assert_eq!(written["storeName"], "Ana's Shop");
        assert_eq!(written["id"], "u1");
    }

    #[test]
    fn test_user_detail_to_current_user() {
        let detail: UserDetail = serde_json::from_value(serde_json::json!({
            "id": "u2",
            "username": "bo",
            "email": "bo@example.com",
            "role": "admin",
            "firstName": "Bo"
        }))
        .unwrap();

        let user = detail.to_current_user();
        assert_eq!(user.username, "bo");
        assert_eq!(user.email.as_deref(), Some("bo@example.com"));
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn test_update_profile_skips_unset_fields() {
        let update = UpdateProfile {
            phone: Some("555-0100".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "555-0100" }));
    }
}
