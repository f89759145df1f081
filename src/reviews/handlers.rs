use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, error::ApiResult, state::AppState};

use super::dto::{CreateReviewRequest, FlagResponse, ReviewFeed};
use super::repo::Review;
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/:id/reviews", post(create_review))
        .route("/reviews/received", get(reviews_received))
        .route("/reviews/given", get(reviews_given))
        .route("/reviews/:id/flag", post(flag_review))
        .route("/users/:id/reviews", get(reviews_for_user))
}

#[instrument(skip(state, body))]
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Json(body): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let review = services::create_review(&state, session_id, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(state))]
pub async fn reviews_received(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<ReviewFeed>> {
    let feed = services::reviews_received(&state, user_id).await?;
    Ok(Json(feed))
}

#[instrument(skip(state))]
pub async fn reviews_given(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = Review::list_given(&state.db, user_id).await?;
    Ok(Json(reviews))
}

#[instrument(skip(state))]
pub async fn flag_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(review_id): Path<Uuid>,
) -> ApiResult<Json<FlagResponse>> {
    let message = services::flag_review(&state, user_id, review_id).await?;
    Ok(Json(FlagResponse {
        message: message.to_string(),
    }))
}

/// Public profile feed: reviews another user has received.
#[instrument(skip(state))]
pub async fn reviews_for_user(
    State(state): State<AppState>,
    AuthUser(_viewer_id): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ReviewFeed>> {
    let feed = services::reviews_received(&state, user_id).await?;
    Ok(Json(feed))
}
