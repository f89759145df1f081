use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Scheduled,
    Rescheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Open sessions are the only ones that may still transition.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Scheduled | SessionStatus::Rescheduled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub host_id: Uuid,
    pub attendee_id: Uuid,
    pub skill_id: Uuid,
    pub swap_request_id: Uuid,
    pub scheduled_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
    pub duration_minutes: i32,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

const SESSION_COLUMNS: &str = r#"id, host_id, attendee_id, skill_id, swap_request_id,
    scheduled_at, ends_at, duration_minutes, status, notes, created_at"#;

impl Session {
    pub async fn insert(
        db: &PgPool,
        host_id: Uuid,
        attendee_id: Uuid,
        skill_id: Uuid,
        swap_request_id: Uuid,
        scheduled_at: OffsetDateTime,
        duration_minutes: i32,
    ) -> anyhow::Result<Session> {
        let ends_at = scheduled_at + time::Duration::minutes(duration_minutes as i64);
        let row = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions
                (id, host_id, attendee_id, skill_id, swap_request_id,
                 scheduled_at, ends_at, duration_minutes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(host_id)
        .bind(attendee_id)
        .bind(skill_id)
        .bind(swap_request_id)
        .bind(scheduled_at)
        .bind(ends_at)
        .bind(duration_minutes)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(&format!(
            r#"SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE host_id = $1 OR attendee_id = $1
            ORDER BY scheduled_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Completes the session inside an open transaction. Guarded on the row
    /// still being open, so a concurrent complete/cancel loses.
    pub async fn complete_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        notes: Option<&str>,
    ) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE sessions
            SET status = 'COMPLETED', notes = COALESCE($2, notes)
            WHERE id = $1 AND status IN ('SCHEDULED', 'RESCHEDULED')
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row)
    }

    /// Cancels an open session, storing the reason in notes.
    pub async fn cancel_if_open(
        db: &PgPool,
        id: Uuid,
        reason: Option<&str>,
    ) -> anyhow::Result<Option<Session>> {
        let row = sqlx::query_as::<_, Session>(&format!(
            r#"
            UPDATE sessions
            SET status = 'CANCELLED', notes = COALESCE($2, notes)
            WHERE id = $1 AND status IN ('SCHEDULED', 'RESCHEDULED')
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reason)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// COMPLETED sessions between two users, counting both role assignments.
    pub async fn completed_between(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM sessions
            WHERE status = 'COMPLETED'
              AND ((host_id = $1 AND attendee_id = $2) OR (host_id = $2 AND attendee_id = $1))
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(db)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_states() {
        assert!(SessionStatus::Scheduled.is_open());
        assert!(SessionStatus::Rescheduled.is_open());
        assert!(!SessionStatus::Completed.is_open());
        assert!(!SessionStatus::Cancelled.is_open());
    }
}
