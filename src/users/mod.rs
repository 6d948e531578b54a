use crate::state::AppState;
use axum::Router;

mod dto;
mod extractors;
pub mod handlers;
mod password;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::register_routes()
}
