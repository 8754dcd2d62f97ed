use serde_json::Value;
use tracing::debug;

use super::params::SearchParams;
use crate::error::ApiError;

/// Stateless client for the YouTube Data API v3.
///
/// Every call attaches the caller's API key as a query credential and relays
/// the upstream JSON response untouched. Only read operations are supported;
/// the write surface needs an OAuth2 scope this service deliberately does
/// not hold.
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut query: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        query.push(("key", self.api_key.as_str()));

        debug!(endpoint, "youtube request");
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("YouTube API error: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::upstream(format!("YouTube API error: {e}")));
        }

        // Error payloads carry the upstream message under error.message.
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("upstream returned {status}")),
            Err(_) => format!("upstream returned {status}"),
        };
        Err(ApiError::upstream(format!("YouTube API error: {message}")))
    }

    // --- read operations ---

    pub async fn search(&self, params: &SearchParams) -> Result<Value, ApiError> {
        self.get("/search", &params.to_query()).await
    }

    pub async fn video(&self, video_id: &str) -> Result<Value, ApiError> {
        self.get(
            "/videos",
            &[
                ("part", "snippet,contentDetails,statistics,status".into()),
                ("id", video_id.into()),
            ],
        )
        .await
    }

    pub async fn videos(&self, video_ids: &[String]) -> Result<Value, ApiError> {
        self.get(
            "/videos",
            &[
                ("part", "snippet,contentDetails,statistics,status".into()),
                ("id", video_ids.join(",")),
            ],
        )
        .await
    }

    pub async fn most_popular(
        &self,
        region_code: Option<&str>,
        max_results: Option<u32>,
    ) -> Result<Value, ApiError> {
        self.get(
            "/videos",
            &[
                ("part", "snippet,contentDetails,statistics".into()),
                ("chart", "mostPopular".into()),
                ("regionCode", region_code.unwrap_or("US").into()),
                ("maxResults", max_results.unwrap_or(25).to_string()),
            ],
        )
        .await
    }

    pub async fn channel(&self, channel_id: &str) -> Result<Value, ApiError> {
        self.get(
            "/channels",
            &[
                (
                    "part",
                    "snippet,contentDetails,statistics,brandingSettings".into(),
                ),
                ("id", channel_id.into()),
            ],
        )
        .await
    }

    pub async fn channel_by_username(&self, username: &str) -> Result<Value, ApiError> {
        self.get(
            "/channels",
            &[
                ("part", "snippet,contentDetails,statistics".into()),
                ("forUsername", username.into()),
            ],
        )
        .await
    }

    /// Latest uploads of a channel, newest first.
    pub async fn channel_videos(
        &self,
        channel_id: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("channelId", channel_id.to_string()),
            ("order", "date".to_string()),
            ("maxResults", max_results.unwrap_or(12).to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("/search", &params).await
    }

    pub async fn playlist(&self, playlist_id: &str) -> Result<Value, ApiError> {
        self.get(
            "/playlists",
            &[
                ("part", "snippet,contentDetails,status".into()),
                ("id", playlist_id.into()),
            ],
        )
        .await
    }

    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", max_results.unwrap_or(50).to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("/playlistItems", &params).await
    }

    pub async fn video_comments(
        &self,
        video_id: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("part", "snippet,replies".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", max_results.unwrap_or(100).to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("/commentThreads", &params).await
    }

    pub async fn comment_replies(
        &self,
        parent_id: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("parentId", parent_id.to_string()),
            ("maxResults", max_results.unwrap_or(100).to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("/comments", &params).await
    }

    pub async fn subscriptions(
        &self,
        channel_id: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let mut params = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("channelId", channel_id.to_string()),
            ("maxResults", max_results.unwrap_or(50).to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("/subscriptions", &params).await
    }

    /// One low-cost search decides the key's fate: success accepts it, any
    /// failure rejects it. Quota exhaustion, permission errors and network
    /// failures are not distinguished.
    pub async fn validate_key(&self) -> bool {
        let probe = SearchParams {
            q: Some("test".into()),
            max_results: Some(1),
            ..Default::default()
        };
        self.search(&probe).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}")
    }

    fn forbidden_upstream() -> Router {
        Router::new().route(
            "/search",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": {
                            "code": 403,
                            "message": "The request is missing a valid API key."
                        }
                    })),
                )
            }),
        )
    }

    #[tokio::test]
    async fn permission_or_quota_failure_invalidates_key() {
        let base = spawn_upstream(forbidden_upstream()).await;
        let client = test_client(base);
        assert!(!client.validate_key().await);
    }

    #[tokio::test]
    async fn upstream_error_message_is_relayed() {
        let base = spawn_upstream(forbidden_upstream()).await;
        let client = test_client(base);
        let err = client.search(&SearchParams::default()).await.unwrap_err();
        match err {
            ApiError::Upstream(msg) => assert_eq!(
                msg,
                "YouTube API error: The request is missing a valid API key."
            ),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_error_without_envelope_reports_status() {
        let router = Router::new().route(
            "/videos",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_upstream(router).await;
        let client = test_client(base);
        let err = client.video("dQw4w9WgXcQ").await.unwrap_err();
        match err {
            ApiError::Upstream(msg) => assert_eq!(
                msg,
                "YouTube API error: upstream returned 500 Internal Server Error"
            ),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_payload_passes_through_verbatim() {
        let router = Router::new().route(
            "/videos",
            get(|| async { Json(json!({"items": [{"id": "dQw4w9WgXcQ"}]})) }),
        );
        let base = spawn_upstream(router).await;
        let client = test_client(base);
        let value = client.video("dQw4w9WgXcQ").await.expect("relay");
        assert_eq!(
            value.pointer("/items/0/id").and_then(Value::as_str),
            Some("dQw4w9WgXcQ")
        );
    }

    fn test_client(base: String) -> YouTubeClient {
        YouTubeClient::new(reqwest::Client::new(), base, "test-key")
    }
}
