//! Reaction Repository Implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{ReactionGroup, ReactionRepository};
use crate::shared::error::AppError;

/// PostgreSQL reaction repository implementation.
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReactionGroupRow {
    message_id: i64,
    emoji: String,
    user_ids: Vec<i64>,
}

// Groups are ordered by their first reaction so the UI order is stable.
const GROUPED_SELECT: &str = r#"
    SELECT message_id, emoji, ARRAY_AGG(user_id ORDER BY created_at) AS user_ids
    FROM message_reactions
    WHERE message_id = ANY($1)
    GROUP BY message_id, emoji
    ORDER BY message_id, MIN(created_at)
"#;

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    async fn add(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_reactions (message_id, user_id, emoji)
            VALUES ($1, $2, $3)
            ON CONFLICT (message_id, user_id, emoji) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM message_reactions WHERE message_id = $1 AND user_id = $2 AND emoji = $3",
        )
        .bind(message_id)
        .bind(user_id)
        .bind(emoji)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_message(&self, message_id: i64) -> Result<Vec<ReactionGroup>, AppError> {
        Ok(self
            .list_for_messages(vec![message_id])
            .await?
            .into_iter()
            .map(|(_, group)| group)
            .collect())
    }

    async fn list_for_messages(
        &self,
        message_ids: Vec<i64>,
    ) -> Result<Vec<(i64, ReactionGroup)>, AppError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ReactionGroupRow>(GROUPED_SELECT)
            .bind(&message_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.message_id,
                    ReactionGroup {
                        emoji: row.emoji,
                        user_ids: row.user_ids,
                    },
                )
            })
            .collect())
    }
}
