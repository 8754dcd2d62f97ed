use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LogoutResponse, PublicUser},
        extractors::{resolve_telegram_user, AuthUser, INIT_DATA_HEADER},
        session::SessionKeys,
    },
    config::SessionConfig,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/telegram", post(telegram_login))
        .route("/auth/me", get(get_me))
        .route("/auth/logout", post(logout))
}

/// Mini-App handshake: verify the signed payload, create-or-refresh the
/// user, then hand back a session cookie usable across requests.
#[instrument(skip(state, headers, jar))]
pub async fn telegram_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<PublicUser>), ApiError> {
    let init_data = headers
        .get(INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation("missing init data header"))?;

    let user = resolve_telegram_user(&state, init_data).await?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys
        .sign(&user.open_id, user.name.as_deref().unwrap_or_default())
        .map_err(ApiError::internal)?;

    info!(user_id = user.id, open_id = %user.open_id, "telegram sign-in");
    let jar = jar.add(session_cookie(&state.config.session, token));
    Ok((jar, Json(user.into())))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.remove(removal_cookie(&state.config.session));
    (jar, Json(LogoutResponse { success: true }))
}

/// Cross-site-compatible attributes: the Mini-App is served from Telegram's
/// origin, so the cookie must be SameSite=None and Secure.
fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::days(config.ttl_days));
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut builder = Cookie::build((config.cookie_name.clone(), "")).path("/");
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}
