use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod notifier;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
