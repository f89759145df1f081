use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{auth::jwt::AuthUser, error::ApiResult, state::AppState};

use super::dto::{
    CancelSessionRequest, CompleteSessionRequest, ScheduleSessionRequest, SessionSummary,
};
use super::repo::Session;
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(schedule_session))
        .route("/sessions/:id/complete", post(complete_session))
        .route("/sessions/:id/cancel", post(cancel_session))
        .route("/sessions/:id/summary", get(session_summary))
}

#[instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<Session>>> {
    let sessions = Session::list_for_user(&state.db, user_id).await?;
    Ok(Json(sessions))
}

#[instrument(skip(state, body))]
pub async fn schedule_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ScheduleSessionRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = services::schedule(
        &state,
        user_id,
        body.swap_request_id,
        body.skill_id,
        body.scheduled_at,
        body.duration_minutes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state, body))]
pub async fn complete_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CompleteSessionRequest>>,
) -> ApiResult<Json<Session>> {
    let notes = body.as_ref().and_then(|b| b.notes.clone());
    let session = services::complete(&state, id, user_id, notes.as_deref()).await?;
    Ok(Json(session))
}

#[instrument(skip(state, body))]
pub async fn cancel_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelSessionRequest>>,
) -> ApiResult<Json<Session>> {
    let reason = body.as_ref().and_then(|b| b.reason.clone());
    let session = services::cancel(&state, id, user_id, reason.as_deref()).await?;
    Ok(Json(session))
}

#[instrument(skip(state))]
pub async fn session_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSummary>> {
    let summary = services::summary(&state, id, user_id).await?;
    Ok(Json(summary))
}
