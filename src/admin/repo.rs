use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct TopUser {
    pub user_id: Uuid,
    pub display_name: String,
    pub total_points: i64,
}

pub async fn user_count(db: &PgPool) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users"#)
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn swaps_by_status(db: &PgPool) -> anyhow::Result<Vec<StatusCount>> {
    let rows = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status::text AS status, COUNT(*) AS count
        FROM swap_requests
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn sessions_completed_since_days(db: &PgPool, days: i32) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM sessions
        WHERE status = 'COMPLETED'
          AND scheduled_at > now() - make_interval(days => $1)
        "#,
    )
    .bind(days)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn top_users_by_points(db: &PgPool, limit: i64) -> anyhow::Result<Vec<TopUser>> {
    let rows = sqlx::query_as::<_, TopUser>(
        r#"
        SELECT u.id AS user_id, u.display_name, COALESCE(SUM(p.amount), 0)::bigint AS total_points
        FROM users u
        JOIN points p ON p.user_id = u.id
        GROUP BY u.id, u.display_name
        ORDER BY total_points DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Flat swap-request rows for the CSV export.
#[derive(Debug, FromRow)]
pub struct SwapExportRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: time::OffsetDateTime,
}

pub async fn swap_export_rows(db: &PgPool) -> anyhow::Result<Vec<SwapExportRow>> {
    let rows = sqlx::query_as::<_, SwapExportRow>(
        r#"
        SELECT id, requester_id, receiver_id, status::text AS status,
               rejection_reason, created_at
        FROM swap_requests
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
