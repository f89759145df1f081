use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Whether a listing offers to teach a skill or asks to learn one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "skill_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SkillKind {
    Teach,
    Learn,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: SkillKind,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

impl UserSkill {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserSkill>> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            SELECT id, user_id, name, kind, description, created_at
            FROM user_skills
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<UserSkill>> {
        let rows = sqlx::query_as::<_, UserSkill>(
            r#"
            SELECT id, user_id, name, kind, description, created_at
            FROM user_skills
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        name: &str,
        kind: SkillKind,
        description: Option<&str>,
    ) -> anyhow::Result<UserSkill> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            INSERT INTO user_skills (id, user_id, name, kind, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, kind, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(kind)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Delete a listing the user owns. Returns whether a row was removed.
    pub async fn delete_owned(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM user_skills
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
