use serde::Deserialize;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub app_id: String,
    pub ttl_days: i64,
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bot_token: String,
    pub session: SessionConfig,
    /// Key material for encrypting stored YouTube API keys.
    /// When unset, keys are stored in plaintext with an empty IV.
    pub encryption_key: Option<String>,
    /// open_id promoted to admin on every upsert.
    pub owner_open_id: Option<String>,
    pub youtube_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let bot_token = std::env::var("BOT_TOKEN")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            app_id: std::env::var("SESSION_APP_ID").unwrap_or_else(|_| "telegram-miniapp".into()),
            ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(365),
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "tubelens_session".into()),
            cookie_domain: std::env::var("SESSION_COOKIE_DOMAIN").ok(),
        };
        Ok(Self {
            database_url,
            bot_token,
            session,
            encryption_key: std::env::var("ENCRYPTION_KEY").ok(),
            owner_open_id: std::env::var("OWNER_OPEN_ID").ok(),
            youtube_api_base: std::env::var("YOUTUBE_API_BASE")
                .unwrap_or_else(|_| YOUTUBE_API_BASE.into()),
        })
    }
}
