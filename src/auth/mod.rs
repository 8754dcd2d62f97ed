use crate::state::AppState;
use axum::Router;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod init_data;
pub mod repo;
pub mod session;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
