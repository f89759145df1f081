use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::dto::CreateSkillRequest;
use super::repo::UserSkill;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route("/skills/:id", delete(delete_skill))
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<UserSkill>>> {
    let skills = UserSkill::list_by_user(&state.db, user_id).await?;
    Ok(Json(skills))
}

#[instrument(skip(state, body))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateSkillRequest>,
) -> ApiResult<(StatusCode, Json<UserSkill>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Skill name is required".into()));
    }

    let skill =
        UserSkill::create(&state.db, user_id, name, body.kind, body.description.as_deref()).await?;
    info!(user_id = %user_id, skill_id = %skill.id, "skill listing created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = UserSkill::delete_owned(&state.db, user_id, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Skill listing not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
