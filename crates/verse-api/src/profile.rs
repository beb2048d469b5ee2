use axum::{Extension, Json, extract::State};
use tracing::info;

use verse_types::api::{ChangePasswordRequest, StatusMessage, UpdateProfilePictureRequest};

use crate::auth::{AppState, hash_password, verify_password};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::Claims;
use crate::run_blocking;

/// The picture is an opaque reference (URL, data URI, blob key); only
/// presence is checked.
pub async fn update_profile_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateProfilePictureRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    if req.profile_picture.trim().is_empty() {
        return Err(ApiError::Validation("Missing data"));
    }

    let db = state.clone();
    let uid = claims.sub.to_string();
    let updated =
        run_blocking(move || Ok(db.store.set_profile_picture(&uid, &req.profile_picture)?))
            .await?;

    if !updated {
        return Err(ApiError::NotFound("User not found"));
    }

    info!("User {} updated profile picture", claims.sub);
    Ok(Json(StatusMessage::new("Profile picture updated")))
}

/// A valid session is not enough: the current password must be proven too.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::Validation("Missing fields"));
    }

    let db = state.clone();
    let uid = claims.sub.to_string();
    run_blocking(move || {
        let user = db
            .store
            .get_user_by_id(&uid)?
            .ok_or(ApiError::NotFound("User not found"))?;

        if !verify_password(&req.old_password, &user.password)? {
            return Err(ApiError::Unauthorized("Old password incorrect"));
        }

        let new_hash = hash_password(&req.new_password)?;
        if !db.store.set_password(&uid, &new_hash)? {
            return Err(ApiError::NotFound("User not found"));
        }
        Ok(())
    })
    .await?;

    info!("User {} changed password", claims.sub);
    Ok(Json(StatusMessage::new("Password changed successfully")))
}
