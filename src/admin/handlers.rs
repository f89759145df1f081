use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::instrument;

use crate::{auth::jwt::AdminUser, error::ApiResult, state::AppState, swaps};

use super::repo::{self, StatusCount, SwapExportRow, TopUser};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/swaps/export.csv", get(export_swaps_csv))
        .route("/admin/swaps/expire", post(expire_swaps))
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub users: i64,
    pub swaps_by_status: Vec<StatusCount>,
    pub sessions_completed_7d: i64,
    pub sessions_completed_30d: i64,
    pub top_users: Vec<TopUser>,
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    let users = repo::user_count(&state.db).await?;
    let swaps_by_status = repo::swaps_by_status(&state.db).await?;
    let sessions_completed_7d = repo::sessions_completed_since_days(&state.db, 7).await?;
    let sessions_completed_30d = repo::sessions_completed_since_days(&state.db, 30).await?;
    let top_users = repo::top_users_by_points(&state.db, 10).await?;

    Ok(Json(DashboardStats {
        users,
        swaps_by_status,
        sessions_completed_7d,
        sessions_completed_30d,
        top_users,
    }))
}

pub(crate) fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub(crate) fn render_swaps_csv(rows: &[SwapExportRow]) -> String {
    let mut out =
        String::from("id,requester_id,receiver_id,status,rejection_reason,created_at\n");
    for row in rows {
        let created = row
            .created_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| row.created_at.to_string());
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            row.id,
            row.requester_id,
            row.receiver_id,
            row.status,
            csv_escape(row.rejection_reason.as_deref().unwrap_or("")),
            created,
        ));
    }
    out
}

#[instrument(skip(state))]
pub async fn export_swaps_csv(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> ApiResult<impl IntoResponse> {
    let rows = repo::swap_export_rows(&state.db).await?;
    let body = render_swaps_csv(&rows);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"swap_requests.csv\"",
            ),
        ],
        body,
    ))
}

/// Manual trigger for the expiry sweep (also runs on a timer).
#[instrument(skip(state))]
pub async fn expire_swaps(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> ApiResult<Json<serde_json::Value>> {
    let expired = swaps::services::expire_lapsed(&state).await?;
    Ok(Json(serde_json::json!({ "expired": expired })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn csv_escaping() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("has,comma"), "\"has,comma\"");
        assert_eq!(csv_escape("has \"quote\""), "\"has \"\"quote\"\"\"");
    }

    #[test]
    fn csv_has_header_and_rows() {
        let rows = vec![SwapExportRow {
            id: Uuid::new_v4(),
            requester_id: Uuid::new_v4(),
            receiver_id: Uuid::new_v4(),
            status: "PENDING".into(),
            rejection_reason: Some("too busy, sorry".into()),
            created_at: OffsetDateTime::now_utc(),
        }];
        let csv = render_swaps_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,requester_id,receiver_id,status,rejection_reason,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("PENDING"));
        assert!(row.contains("\"too busy, sorry\""));
    }
}
