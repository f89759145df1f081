use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Origin of a point ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "point_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointType {
    Earned,
    AdjustedAdd,
    AdjustedDeduct,
}

/// Append-only ledger entry. Amounts are signed; totals are derived by
/// summation and rows are never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Point {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub reason: String,
    pub kind: PointType,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    /// Completed-session threshold, stored as a stringified integer.
    pub requirement: String,
    pub points: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub unlocked_at: OffsetDateTime,
    pub is_pinned: bool,
}

/// The single write path into the point ledger.
pub async fn insert_point(
    db: &PgPool,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    kind: PointType,
) -> anyhow::Result<Point> {
    let row = sqlx::query_as::<_, Point>(
        r#"
        INSERT INTO points (id, user_id, amount, reason, kind)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, amount, reason, kind, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(kind)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Ledger insert inside an open transaction (session completion awards).
pub async fn insert_point_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    kind: PointType,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO points (id, user_id, amount, reason, kind)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(kind)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn points_total(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    // SUM over BIGINT yields NUMERIC; cast back for the i64 decode.
    let total = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(SUM(amount), 0)::bigint FROM points WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn points_history(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Point>> {
    let rows = sqlx::query_as::<_, Point>(
        r#"
        SELECT id, user_id, amount, reason, kind, created_at
        FROM points
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_active_badges(db: &PgPool) -> anyhow::Result<Vec<Badge>> {
    let rows = sqlx::query_as::<_, Badge>(
        r#"
        SELECT id, name, icon, requirement, points, is_active
        FROM badges
        WHERE is_active = true
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_badge(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Badge>> {
    let row = sqlx::query_as::<_, Badge>(
        r#"
        SELECT id, name, icon, requirement, points, is_active
        FROM badges
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_user_badges(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<UserBadge>> {
    let rows = sqlx::query_as::<_, UserBadge>(
        r#"
        SELECT user_id, badge_id, unlocked_at, is_pinned
        FROM user_badges
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Unlocks one badge: the ownership row and its point award commit together.
/// Idempotent via the (user_id, badge_id) unique constraint; returns the new
/// ownership row, or None when the badge was already owned.
pub async fn unlock_badge(
    db: &PgPool,
    user_id: Uuid,
    badge: &Badge,
) -> anyhow::Result<Option<UserBadge>> {
    let mut tx = db.begin().await?;

    let inserted = sqlx::query_as::<_, UserBadge>(
        r#"
        INSERT INTO user_badges (user_id, badge_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, badge_id) DO NOTHING
        RETURNING user_id, badge_id, unlocked_at, is_pinned
        "#,
    )
    .bind(user_id)
    .bind(badge.id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_badge) = inserted else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query(
        r#"
        INSERT INTO points (id, user_id, amount, reason, kind)
        VALUES ($1, $2, $3, $4, 'EARNED')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(badge.points)
    .bind(format!("Unlocked badge: {}", badge.name))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(user_badge))
}

pub async fn update_badge_requirement(
    db: &PgPool,
    badge_id: Uuid,
    requirement: &str,
) -> anyhow::Result<Option<Badge>> {
    let row = sqlx::query_as::<_, Badge>(
        r#"
        UPDATE badges
        SET requirement = $2
        WHERE id = $1
        RETURNING id, name, icon, requirement, points, is_active
        "#,
    )
    .bind(badge_id)
    .bind(requirement)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Toggle the pin flag on an owned badge. Returns whether a row matched.
pub async fn set_badge_pinned(
    db: &PgPool,
    user_id: Uuid,
    badge_id: Uuid,
    pinned: bool,
) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        UPDATE user_badges
        SET is_pinned = $3
        WHERE user_id = $1 AND badge_id = $2
        "#,
    )
    .bind(user_id)
    .bind(badge_id)
    .bind(pinned)
    .execute(db)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Completed sessions in either role. Host and attendee are distinct users by
/// construction, so no dedup is needed.
pub async fn completed_sessions_count(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let hosted = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM sessions WHERE host_id = $1 AND status = 'COMPLETED'"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    let attended = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM sessions WHERE attendee_id = $1 AND status = 'COMPLETED'"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(hosted + attended)
}
