use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, error::ApiResult, state::AppState};

use super::dto::{CreateSwapRequest, DeclineSwapRequest};
use super::repo::SwapRequest;
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/swaps", post(create_swap))
        .route("/swaps/sent", get(list_sent))
        .route("/swaps/received", get(list_received))
        .route("/swaps/:id", get(get_swap))
        .route("/swaps/:id/accept", post(accept_swap))
        .route("/swaps/:id/decline", post(decline_swap))
        .route("/swaps/:id/cancel", post(cancel_swap))
}

#[instrument(skip(state, body))]
pub async fn create_swap(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateSwapRequest>,
) -> ApiResult<(StatusCode, Json<SwapRequest>)> {
    let swap = services::create_swap(
        &state,
        user_id,
        body.offered_user_skill_id,
        body.requested_user_skill_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(swap)))
}

#[instrument(skip(state))]
pub async fn list_sent(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<SwapRequest>>> {
    let swaps = SwapRequest::list_sent(&state.db, user_id).await?;
    Ok(Json(swaps))
}

#[instrument(skip(state))]
pub async fn list_received(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<SwapRequest>>> {
    let swaps = SwapRequest::list_received(&state.db, user_id).await?;
    Ok(Json(swaps))
}

#[instrument(skip(state))]
pub async fn get_swap(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SwapRequest>> {
    let swap = services::get_swap(&state, id, user_id).await?;
    Ok(Json(swap))
}

#[instrument(skip(state))]
pub async fn accept_swap(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SwapRequest>> {
    let swap = services::accept_swap(&state, id, user_id).await?;
    Ok(Json(swap))
}

#[instrument(skip(state, body))]
pub async fn decline_swap(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<DeclineSwapRequest>>,
) -> ApiResult<Json<SwapRequest>> {
    let reason = body.as_ref().and_then(|b| b.reason.clone());
    let swap = services::decline_swap(&state, id, user_id, reason.as_deref()).await?;
    Ok(Json(swap))
}

#[instrument(skip(state))]
pub async fn cancel_swap(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SwapRequest>> {
    let swap = services::cancel_swap(&state, id, user_id).await?;
    Ok(Json(swap))
}
