use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Post-session rating by one participant (giver) about the other (receiver).
/// Immutable once created, except for the receiver-driven flag.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub session_id: Uuid,
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
    pub rating: i16,
    pub knowledge: i16,
    pub communication: i16,
    pub punctuality: i16,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub is_public: bool,
    pub is_flagged: bool,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

const REVIEW_COLUMNS: &str = r#"id, session_id, giver_id, receiver_id, rating, knowledge,
    communication, punctuality, strengths, improvements, is_public, is_flagged, is_verified,
    created_at"#;

pub struct NewReview<'a> {
    pub session_id: Uuid,
    pub giver_id: Uuid,
    pub receiver_id: Uuid,
    pub rating: i16,
    pub knowledge: i16,
    pub communication: i16,
    pub punctuality: i16,
    pub strengths: Option<&'a str>,
    pub improvements: Option<&'a str>,
    pub is_public: bool,
}

impl Review {
    pub async fn insert(db: &PgPool, new: NewReview<'_>) -> anyhow::Result<Review> {
        let row = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews
                (id, session_id, giver_id, receiver_id, rating, knowledge,
                 communication, punctuality, strengths, improvements, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.session_id)
        .bind(new.giver_id)
        .bind(new.receiver_id)
        .bind(new.rating)
        .bind(new.knowledge)
        .bind(new.communication)
        .bind(new.punctuality)
        .bind(new.strengths)
        .bind(new.improvements)
        .bind(new.is_public)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query_as::<_, Review>(&format!(
            r#"SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// One review per (session, giver) pair.
    pub async fn exists_for(db: &PgPool, session_id: Uuid, giver_id: Uuid) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM reviews WHERE session_id = $1 AND giver_id = $2)"#,
        )
        .bind(session_id)
        .bind(giver_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    pub async fn list_received(db: &PgPool, receiver_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE receiver_id = $1 AND is_public = true AND is_flagged = false
            ORDER BY created_at DESC
            "#
        ))
        .bind(receiver_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_given(db: &PgPool, giver_id: Uuid) -> anyhow::Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE giver_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(giver_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn mark_flagged(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE reviews SET is_flagged = true WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
