use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    keys::repo,
    state::AppState,
    youtube::client::YouTubeClient,
};

pub fn key_routes() -> Router<AppState> {
    Router::new().route(
        "/youtube/key",
        get(has_key).put(save_key).delete(delete_key),
    )
}

#[derive(Debug, Serialize)]
pub struct HasKeyResponse {
    pub has_key: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[instrument(skip(state))]
pub async fn has_key(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<HasKeyResponse> {
    let has_key = repo::has_active(&state.db, user.id).await;
    Json(HasKeyResponse { has_key })
}

/// Validates the key against the upstream API with a single one-result
/// search before persisting it. Any upstream failure, quota exhaustion
/// included, rejects the key as invalid.
#[instrument(skip(state, payload))]
pub async fn save_key(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SaveKeyRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if payload.api_key.is_empty() {
        return Err(ApiError::validation("api_key must not be empty"));
    }

    let client = YouTubeClient::new(
        state.http.clone(),
        state.config.youtube_api_base.clone(),
        payload.api_key.clone(),
    );
    if !client.validate_key().await {
        warn!(user_id = user.id, "rejected invalid YouTube API key");
        return Err(ApiError::validation("invalid YouTube API key"));
    }

    repo::save(&state.db, &state.cipher, user.id, &payload.api_key)
        .await
        .map_err(ApiError::storage)?;
    info!(user_id = user.id, "saved YouTube API key");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn delete_key(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SuccessResponse>, ApiError> {
    repo::deactivate_all(&state.db, user.id)
        .await
        .map_err(ApiError::storage)?;
    info!(user_id = user.id, "deactivated YouTube API keys");
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_key_serialization() {
        let json = serde_json::to_string(&HasKeyResponse { has_key: true }).unwrap();
        assert_eq!(json, r#"{"has_key":true}"#);
    }

    #[test]
    fn save_key_request_parses() {
        let req: SaveKeyRequest = serde_json::from_str(r#"{"api_key":"AIza"}"#).unwrap();
        assert_eq!(req.api_key, "AIza");
    }
}
