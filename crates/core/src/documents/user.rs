//! Authenticated session documents.
//!
//! The session is split in two: the profile is plain, the auth document holds
//! encrypted tokens.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub subscription: Option<serde_json::Value>,
}

/// API tokens of the signed-in user. Both tokens are ciphertext.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiration as unix milliseconds.
    pub token_expiration_timestamp: i64,
}
