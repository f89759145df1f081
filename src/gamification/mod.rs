use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub fn admin_router() -> Router<AppState> {
    handlers::admin_routes()
}
