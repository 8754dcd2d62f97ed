use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    prefs::repo::{self, Language},
    state::AppState,
};

pub fn pref_routes() -> Router<AppState> {
    Router::new()
        .route("/preferences", get(get_preferences))
        .route("/preferences/language", put(set_language))
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<PreferencesResponse> {
    let language = repo::language_for(&state.db, user.id).await;
    Json(PreferencesResponse { language })
}

#[instrument(skip(state))]
pub async fn set_language(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SetLanguageRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    repo::set_language(&state.db, user.id, payload.language)
        .await
        .map_err(ApiError::storage)?;
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_json() {
        let req: SetLanguageRequest = serde_json::from_str(r#"{"language":"ru"}"#).unwrap();
        assert_eq!(req.language, Language::Ru);
        let json = serde_json::to_string(&PreferencesResponse {
            language: Language::En,
        })
        .unwrap();
        assert_eq!(json, r#"{"language":"en"}"#);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(serde_json::from_str::<SetLanguageRequest>(r#"{"language":"de"}"#).is_err());
    }
}
