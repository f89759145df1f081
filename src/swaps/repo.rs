use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle states of a swap request.
///
/// PENDING is the only state users can transition out of; everything else is
/// terminal. COMPLETED is reached through session completion, never directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swap_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Expired,
    Completed,
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending | SwapStatus::Accepted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub receiver_id: Uuid,
    pub offered_user_skill_id: Uuid,
    pub requested_user_skill_id: Uuid,
    pub status: SwapStatus,
    pub rejection_reason: Option<String>,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const SWAP_COLUMNS: &str = r#"id, requester_id, receiver_id, offered_user_skill_id,
    requested_user_skill_id, status, rejection_reason, expires_at, created_at, updated_at"#;

impl SwapRequest {
    pub async fn insert(
        db: &PgPool,
        requester_id: Uuid,
        receiver_id: Uuid,
        offered_user_skill_id: Uuid,
        requested_user_skill_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<SwapRequest> {
        let row = sqlx::query_as::<_, SwapRequest>(&format!(
            r#"
            INSERT INTO swap_requests
                (id, requester_id, receiver_id, offered_user_skill_id,
                 requested_user_skill_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(receiver_id)
        .bind(offered_user_skill_id)
        .bind(requested_user_skill_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<SwapRequest>> {
        let row = sqlx::query_as::<_, SwapRequest>(&format!(
            r#"SELECT {SWAP_COLUMNS} FROM swap_requests WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Duplicate guard: a PENDING request already open on the same
    /// (requester, offered, requested) triple.
    pub async fn pending_duplicate_exists(
        db: &PgPool,
        requester_id: Uuid,
        offered_user_skill_id: Uuid,
        requested_user_skill_id: Uuid,
    ) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM swap_requests
                WHERE requester_id = $1
                  AND offered_user_skill_id = $2
                  AND requested_user_skill_id = $3
                  AND status = 'PENDING'
            )
            "#,
        )
        .bind(requester_id)
        .bind(offered_user_skill_id)
        .bind(requested_user_skill_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Atomic status transition: updates only when the row is still in
    /// `expected`, so two concurrent transitions cannot both succeed.
    /// Returns the updated row, or None when the guard did not match.
    pub async fn update_status_if(
        db: &PgPool,
        id: Uuid,
        expected: SwapStatus,
        new: SwapStatus,
        rejection_reason: Option<&str>,
    ) -> anyhow::Result<Option<SwapRequest>> {
        let row = sqlx::query_as::<_, SwapRequest>(&format!(
            r#"
            UPDATE swap_requests
            SET status = $3,
                rejection_reason = COALESCE($4, rejection_reason),
                updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {SWAP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected)
        .bind(new)
        .bind(rejection_reason)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Marks the request COMPLETED inside an open transaction (session
    /// completion cascade).
    pub async fn complete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE swap_requests
            SET status = 'COMPLETED', updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Bulk sweep: PENDING rows past their expiry become EXPIRED.
    pub async fn expire_pending(db: &PgPool) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE swap_requests
            SET status = 'EXPIRED', updated_at = now()
            WHERE status = 'PENDING' AND expires_at < now()
            "#,
        )
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn list_sent(db: &PgPool, requester_id: Uuid) -> anyhow::Result<Vec<SwapRequest>> {
        let rows = sqlx::query_as::<_, SwapRequest>(&format!(
            r#"
            SELECT {SWAP_COLUMNS}
            FROM swap_requests
            WHERE requester_id = $1
              AND NOT (status = 'PENDING' AND expires_at < now())
            ORDER BY created_at DESC
            "#
        ))
        .bind(requester_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_received(db: &PgPool, receiver_id: Uuid) -> anyhow::Result<Vec<SwapRequest>> {
        let rows = sqlx::query_as::<_, SwapRequest>(&format!(
            r#"
            SELECT {SWAP_COLUMNS}
            FROM swap_requests
            WHERE receiver_id = $1
              AND NOT (status = 'PENDING' AND expires_at < now())
            ORDER BY created_at DESC
            "#
        ))
        .bind(receiver_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!SwapStatus::Pending.is_terminal());
        assert!(!SwapStatus::Accepted.is_terminal());
        assert!(SwapStatus::Rejected.is_terminal());
        assert!(SwapStatus::Cancelled.is_terminal());
        assert!(SwapStatus::Expired.is_terminal());
        assert!(SwapStatus::Completed.is_terminal());
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&SwapStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }
}
