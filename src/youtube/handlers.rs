use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    keys,
    state::AppState,
    youtube::{client::YouTubeClient, params::SearchParams},
};

/// Header carrying a client-held API key, used as an alternative flow when
/// the user has no server-stored key.
pub const CLIENT_KEY_HEADER: &str = "x-youtube-api-key";

pub fn youtube_routes() -> Router<AppState> {
    Router::new()
        .route("/youtube/search", get(search))
        .route("/youtube/videos", get(get_videos))
        .route("/youtube/videos/popular", get(get_most_popular))
        .route("/youtube/videos/:id", get(get_video).delete(write_unsupported))
        .route("/youtube/videos/:id/rating", post(write_unsupported))
        .route("/youtube/videos/:id/comments", get(get_video_comments))
        .route("/youtube/channels", get(get_channel_by_username))
        .route("/youtube/channels/:id", get(get_channel))
        .route("/youtube/channels/:id/videos", get(get_channel_videos))
        .route(
            "/youtube/channels/:id/subscriptions",
            get(get_subscriptions),
        )
        .route("/youtube/playlists", post(write_unsupported))
        .route(
            "/youtube/playlists/:id",
            get(get_playlist).put(write_unsupported).delete(write_unsupported),
        )
        .route(
            "/youtube/playlists/:id/items",
            get(get_playlist_items).post(write_unsupported),
        )
        .route("/youtube/comments", post(write_unsupported))
        .route("/youtube/comments/:id", delete(write_unsupported))
        .route("/youtube/comments/:id/replies", get(get_comment_replies))
        .route("/youtube/subscriptions", post(write_unsupported))
        .route("/youtube/subscriptions/:id", delete(write_unsupported))
}

/// Client-held API key from the request header, when present.
pub struct ClientApiKey(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientApiKey {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientApiKey(
            parts
                .headers
                .get(CLIENT_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}

/// Builds an upstream client for the user: the stored active key wins, the
/// request header is the fallback.
async fn client_for(
    state: &AppState,
    user_id: i64,
    client_key: Option<String>,
) -> Result<YouTubeClient, ApiError> {
    let stored = keys::repo::active_key(&state.db, &state.cipher, user_id)
        .await
        .map_err(ApiError::storage)?;
    let api_key = stored
        .or(client_key)
        .ok_or_else(|| ApiError::validation("no active YouTube API key found"))?;
    Ok(YouTubeClient::new(
        state.http.clone(),
        state.config.youtube_api_base.clone(),
        api_key,
    ))
}

#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    /// Comma-separated video ids.
    pub ids: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularQuery {
    pub region_code: Option<String>,
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub max_results: Option<u32>,
    pub page_token: Option<String>,
}

#[instrument(skip(state, key, params))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client.search(&params).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_video(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client.video(&id).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_videos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Query(query): Query<IdsQuery>,
) -> Result<Json<Value>, ApiError> {
    let ids: Vec<String> = query
        .ids
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    let client = client_for(&state, user.id, key).await?;
    client.videos(&ids).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_most_popular(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .most_popular(query.region_code.as_deref(), query.max_results)
        .await
        .map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_channel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client.channel(&id).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_channel_by_username(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client.channel_by_username(&query.username).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_channel_videos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .channel_videos(&id, page.max_results, page.page_token.as_deref())
        .await
        .map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_playlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client.playlist(&id).await.map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_playlist_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .playlist_items(&id, page.max_results, page.page_token.as_deref())
        .await
        .map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_video_comments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .video_comments(&id, page.max_results, page.page_token.as_deref())
        .await
        .map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_comment_replies(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .comment_replies(&id, page.max_results, page.page_token.as_deref())
        .await
        .map(Json)
}

#[instrument(skip(state, key))]
pub async fn get_subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ClientApiKey(key): ClientApiKey,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = client_for(&state, user.id, key).await?;
    client
        .subscriptions(&id, page.max_results, page.page_token.as_deref())
        .await
        .map(Json)
}

/// The write surface of the upstream API needs an OAuth2 scope this service
/// does not implement. Every mutating route lands here and fails the same
/// way regardless of input.
#[instrument(skip_all)]
pub async fn write_unsupported(AuthUser(_user): AuthUser) -> ApiError {
    ApiError::CapabilityUnsupported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{User, UserRole};
    use time::OffsetDateTime;

    fn caller(role: UserRole) -> User {
        User {
            id: 1,
            open_id: "42".into(),
            name: Some("Ann".into()),
            email: None,
            login_method: Some("telegram".into()),
            role,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
            last_signed_in: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn mutating_routes_are_rejected_for_any_caller() {
        // Admin role buys nothing here; the rejection is unconditional.
        for role in [UserRole::User, UserRole::Admin] {
            let err = write_unsupported(AuthUser(caller(role))).await;
            assert!(matches!(err, ApiError::CapabilityUnsupported));
        }
    }
}
