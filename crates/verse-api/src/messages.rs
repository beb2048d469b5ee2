use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::SubsecRound;
use tracing::{debug, warn};
use uuid::Uuid;

use verse_db::models::{MessageRow, format_timestamp};
use verse_types::api::SendMessageRequest;
use verse_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::Claims;
use crate::run_blocking;

/// The sender is always the authenticated caller, never a body field.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.receiver.trim().is_empty() || req.text.trim().is_empty() {
        return Err(ApiError::Validation("Receiver and text are required"));
    }
    let receiver: Uuid = req
        .receiver
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid receiver"))?;

    let message = Message {
        id: Uuid::new_v4(),
        sender: claims.sub,
        receiver,
        text: req.text,
        // Stored at microsecond precision; match it so replies and reads agree
        created_at: chrono::Utc::now().trunc_subsecs(6),
    };

    let db = state.clone();
    let row = MessageRow {
        id: message.id.to_string(),
        sender: message.sender.to_string(),
        receiver: message.receiver.to_string(),
        text: message.text.clone(),
        created_at: format_timestamp(message.created_at),
    };
    run_blocking(move || {
        // A valid token can outlive its user row (e.g. after a database reset)
        if db.store.get_user_by_id(&row.sender)?.is_none() {
            return Err(ApiError::NotFound("User not found"));
        }
        if db.store.get_user_by_id(&row.receiver)?.is_none() {
            return Err(ApiError::NotFound("Receiver not found"));
        }
        db.store.insert_message(&row)?;
        Ok(())
    })
    .await?;

    debug!("Message {} sent {} -> {}", message.id, message.sender, message.receiver);
    Ok((StatusCode::CREATED, Json(message)))
}

/// Both directions of the caller's exchange with `user_id`, oldest first.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let other: Uuid = user_id
        .parse()
        .map_err(|_| ApiError::Validation("Invalid user id"))?;

    let db = state.clone();
    let me = claims.sub.to_string();
    let rows = run_blocking(move || Ok(db.store.get_conversation(&me, &other.to_string())?))
        .await?;

    Ok(Json(rows.into_iter().map(message_from_row).collect()))
}

fn message_from_row(row: MessageRow) -> Message {
    let parse_id = |field: &str, value: &str| {
        value.parse().unwrap_or_else(|e| {
            warn!("Corrupt {} '{}' on message '{}': {}", field, value, row.id, e);
            Uuid::default()
        })
    };

    Message {
        id: parse_id("id", &row.id),
        sender: parse_id("sender", &row.sender),
        receiver: parse_id("receiver", &row.receiver),
        created_at: chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map(|ts| ts.to_utc())
            .unwrap_or_else(|e| {
                warn!("Corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
        text: row.text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_wire_message() {
        let id = Uuid::new_v4();
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let ts = chrono::Utc::now();

        let msg = message_from_row(MessageRow {
            id: id.to_string(),
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            text: "hello".into(),
            created_at: format_timestamp(ts),
        });

        assert_eq!(msg.id, id);
        assert_eq!(msg.sender, sender);
        assert_eq!(msg.receiver, receiver);
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.created_at.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn corrupt_row_fields_fall_back_to_defaults() {
        let msg = message_from_row(MessageRow {
            id: "not-a-uuid".into(),
            sender: Uuid::new_v4().to_string(),
            receiver: Uuid::new_v4().to_string(),
            text: "x".into(),
            created_at: "yesterday".into(),
        });

        assert_eq!(msg.id, Uuid::default());
        assert_eq!(msg.created_at, chrono::DateTime::<chrono::Utc>::default());
    }
}
