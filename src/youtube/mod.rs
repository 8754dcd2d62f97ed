use crate::state::AppState;
use axum::Router;

pub mod client;
pub mod handlers;
pub mod params;

pub fn router() -> Router<AppState> {
    handlers::youtube_routes()
}
