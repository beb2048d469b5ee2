use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- Token claims --

/// Claims embedded in a session token. Shared by the issuing login handler
/// and the `require_auth` middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Generic --

/// `{ "message": ... }` body used for acknowledgements and errors alike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Auth --
//
// Request fields default to empty, and an explicit `null` reads as empty,
// so both reach handler validation (400) instead of failing extraction.
// Unknown fields are ignored.

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

// -- Profile --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfilePictureRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub profile_picture: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub old_password: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub new_password: String,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub receiver: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub text: String,
}
