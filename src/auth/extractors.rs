use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::{
    auth::{
        init_data::{parse_identity, verify_init_data, InitDataError},
        repo::{UpsertUser, User, UserRole},
        session::SessionKeys,
    },
    error::ApiError,
    state::AppState,
};

/// Header a Mini-App client uses to carry the signed Telegram payload.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Extracts the authenticated user, trying strategies in fixed priority
/// order: the Telegram init-data header first, then the session cookie.
/// Each strategy either resolves an identity or reports "not applicable";
/// when all fail the request is rejected with a generic forbidden.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = from_init_data_header(parts, state).await? {
            return Ok(AuthUser(user));
        }
        if let Some(user) = from_session_cookie(parts, state).await? {
            return Ok(AuthUser(user));
        }
        Err(ApiError::AuthenticationRejected)
    }
}

async fn from_init_data_header(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<User>, ApiError> {
    let Some(init_data) = parts
        .headers
        .get(INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };
    resolve_telegram_user(state, init_data).await.map(Some)
}

async fn from_session_cookie(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|c| c.value().to_string());
    let Some(session) = SessionKeys::from_ref(state).verify(token.as_deref()) else {
        return Ok(None);
    };

    // A valid cookie for a since-unknown open_id is not an authenticated user.
    User::find_by_open_id(&state.db, &session.open_id)
        .await
        .map_err(ApiError::storage)
}

/// Verifies the init-data payload and resolves it to a database user,
/// creating the row on first sign-in and refreshing last_signed_in otherwise.
pub async fn resolve_telegram_user(state: &AppState, init_data: &str) -> Result<User, ApiError> {
    let fields = verify_init_data(init_data, &state.config.bot_token).map_err(|e| {
        warn!(error = %e, "init data verification failed");
        ApiError::AuthenticationRejected
    })?;

    let identity = parse_identity(&fields).map_err(|e| match e {
        InitDataError::MissingUser | InitDataError::InvalidUser => {
            ApiError::validation(e.to_string())
        }
        _ => ApiError::AuthenticationRejected,
    })?;

    let open_id = identity.open_id();
    let name = identity.display_name();
    let role = state
        .config
        .owner_open_id
        .as_deref()
        .filter(|owner| *owner == open_id)
        .map(|_| UserRole::Admin);

    User::upsert(
        &state.db,
        UpsertUser {
            open_id: &open_id,
            name: Some(&name),
            email: None, // Telegram does not provide email
            login_method: Some("telegram"),
            role,
        },
    )
    .await
    .map_err(ApiError::storage)
}
