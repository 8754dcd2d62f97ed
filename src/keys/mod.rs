use crate::state::AppState;
use axum::Router;

pub mod crypto;
pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::key_routes()
}
