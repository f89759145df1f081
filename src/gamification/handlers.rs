use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::{AdminUser, AuthUser},
    error::ApiResult,
    state::AppState,
};

use super::dto::{
    AdjustPointsRequest, BadgeCatalog, BadgeCheckResult, PinBadgeRequest, PointsSummary,
    UpdateRequirementRequest,
};
use super::repo::{self, Badge, Point};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/badges", get(get_all_badges))
        .route("/badges/check", post(check_badges))
        .route("/badges/:id/pin", post(pin_badge))
        .route("/points", get(get_points))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/badges/:id/requirement", patch(update_requirement))
        .route("/admin/points/adjust", post(adjust_points))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[instrument(skip(state))]
pub async fn get_all_badges(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<BadgeCatalog>> {
    let catalog = services::get_all_badges(&state, user_id).await?;
    Ok(Json(catalog))
}

#[instrument(skip(state))]
pub async fn check_badges(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<BadgeCheckResult>> {
    let result = services::check_badges(&state, user_id).await?;
    Ok(Json(result))
}

#[instrument(skip(state, body))]
pub async fn pin_badge(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(badge_id): Path<Uuid>,
    Json(body): Json<PinBadgeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    services::pin_badge(&state, user_id, badge_id, body.pinned).await?;
    Ok(Json(serde_json::json!({ "pinned": body.pinned })))
}

#[instrument(skip(state))]
pub async fn get_points(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<PointsSummary>> {
    let total = repo::points_total(&state.db, user_id).await?;
    let history = repo::points_history(&state.db, user_id, p.limit, p.offset).await?;
    Ok(Json(PointsSummary { total, history }))
}

#[instrument(skip(state, body))]
pub async fn update_requirement(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(badge_id): Path<Uuid>,
    Json(body): Json<UpdateRequirementRequest>,
) -> ApiResult<Json<Badge>> {
    let badge = services::update_badge_requirement(&state, badge_id, &body.requirement).await?;
    Ok(Json(badge))
}

#[instrument(skip(state, body))]
pub async fn adjust_points(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Json(body): Json<AdjustPointsRequest>,
) -> ApiResult<Json<Point>> {
    let point =
        services::award_points(&state, body.user_id, body.amount, &body.reason, body.kind).await?;
    Ok(Json(point))
}
