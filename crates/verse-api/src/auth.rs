use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use axum::{Json, extract::State};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use verse_db::Store;
use verse_db::models::{UserRow, format_timestamp};
use verse_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, StatusMessage};
use verse_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Box<dyn Store>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("All fields required"));
    }

    let user_id = Uuid::new_v4();
    let db = state.clone();
    let logged_email = email.clone();
    run_blocking(move || {
        let password_hash = hash_password(&req.password)?;
        db.store.create_user(&UserRow {
            id: user_id.to_string(),
            email,
            password: password_hash,
            profile_picture: None,
            created_at: format_timestamp(chrono::Utc::now()),
        })?;
        Ok(())
    })
    .await
    .inspect_err(|e| {
        if matches!(e, ApiError::Conflict(_)) {
            debug!("Registration rejected, {} already taken", logged_email);
        }
    })?;

    info!("Registered user {} ({})", user_id, logged_email);
    Ok(Json(StatusMessage::new("User registered successfully")))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("All fields required"));
    }

    let db = state.clone();
    let user = run_blocking(move || {
        let Some(user) = db.store.get_user_by_email(&email)? else {
            warn!("Login failed: no user with email {}", email);
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !verify_password(&req.password, &user.password)? {
            warn!("Login failed: wrong password for {}", user.id);
            return Err(ApiError::Unauthorized("Invalid password"));
        }

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::Internal(format!("corrupt user id '{}': {}", user.id, e)))?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, state.token_ttl)?;

    info!("User {} logged in", user_id);
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: User {
            id: user_id,
            email: user.email,
            profile_picture: user.profile_picture,
        },
    }))
}

/// Argon2id with a fresh random salt. Output is a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

/// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash unreadable: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(format!("password verification failed: {}", e))),
    }
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    ttl: chrono::Duration,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
}

/// Signature and expiry are checked together; either failure is `Forbidden`.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Token rejected: {}", e);
        ApiError::Forbidden("Invalid token")
    })
}
