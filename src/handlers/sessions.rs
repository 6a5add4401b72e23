//! # Session API Handlers
//!
//! This module contains handlers for browsing the durable session history:
//! one row per submitted workflow job, kept after the in-memory record has
//! expired.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::UserExtension;
use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{ApiError, validation_error};
use crate::models::workflow_session::{SessionDetail, SessionSummary};
use crate::server::AppState;

/// Query parameters for listing sessions
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Maximum number of sessions to return (default: 50, max: 100)
    pub limit: Option<u32>,
    /// Opaque cursor for pagination
    pub cursor: Option<String>,
}

/// Response payload for the session list endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsResponse {
    /// Sessions owned by the caller, newest activity first
    pub sessions: Vec<SessionSummary>,
    /// Opaque cursor for fetching the next page (null if no more pages)
    pub next_cursor: Option<String>,
}

/// Response payload for the session detail endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session: SessionDetail,
}

/// List the caller's workflow sessions
#[utoipa::path(
    get,
    path = "/sessions",
    security(("bearer_auth" = [])),
    params(
        ("cursor" = Option<String>, Query, description = "Pagination cursor from a previous page"),
        ("limit" = Option<u32>, Query, description = "Maximum number of sessions to return (default 50, max 100)")
    ),
    responses(
        (status = 200, description = "Sessions owned by the caller", body = SessionsResponse, example = json!({
            "sessions": [
                {
                    "id": "550e8400-e29b-41d4-a716-446655440000",
                    "file_name": "loan-agreement.pdf",
                    "status": "completed",
                    "current_stage": "DONE",
                    "document_id": "550e8400-e29b-41d4-a716-446655440001",
                    "created_at": "2026-07-02T12:00:00Z",
                    "updated_at": "2026-07-02T12:05:00Z"
                }
            ],
            "next_cursor": null
        })),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    UserExtension(user): UserExtension,
    Query(params): Query<ListSessionsQuery>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let limit = match params.limit {
        Some(value) if value > 100 => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({
                    "limit": "Maximum allowed limit is 100"
                }),
            ));
        }
        Some(0) => {
            return Err(validation_error(
                "Invalid limit",
                serde_json::json!({
                    "limit": "Minimum allowed limit is 1"
                }),
            ));
        }
        Some(value) => value,
        None => 50,
    };

    let cursor = match &params.cursor {
        Some(cursor_str) => Some(decode_cursor(cursor_str)?),
        None => None,
    };

    // Fetch one extra row to learn whether another page exists.
    let mut rows = state
        .sessions
        .list_for_user(user.0, u64::from(limit) + 1, cursor)
        .await?;

    let next_cursor = if rows.len() as u32 > limit {
        rows.truncate(limit as usize);
        rows.last()
            .map(|row| encode_cursor(&row.updated_at.with_timezone(&Utc), &row.id))
    } else {
        None
    };

    Ok(Json(SessionsResponse {
        sessions: rows.into_iter().map(SessionSummary::from).collect(),
        next_cursor,
    }))
}

/// Fetch one session with its full stage and result payload
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Session identifier (same value as the job id)")
    ),
    responses(
        (status = 200, description = "Full session row", body = SessionResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "No such session for this user", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    UserExtension(user): UserExtension,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let not_found = || ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Session not found");

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let session = state
        .sessions
        .find_for_user(id, user.0)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(SessionResponse {
        session: session.into(),
    }))
}
