//! Message Repository Implementation
//!
//! PostgreSQL implementation of message operations with cursor-based
//! pagination. History queries join the author so callers get display
//! information without a second round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{AuthoredMessage, Message, MessageAuthor, MessageRepository};
use crate::shared::error::AppError;

const MESSAGE_COLUMNS: &str =
    "id, channel_id, author_id, content, attachments, edited_at, created_at";

const AUTHORED_SELECT: &str = r#"
    SELECT m.id, m.channel_id, m.author_id, m.content, m.attachments,
           m.edited_at, m.created_at,
           u.username AS author_username, u.avatar_url AS author_avatar_url
    FROM messages m
    JOIN users u ON u.id = m.author_id
"#;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    channel_id: i64,
    author_id: i64,
    content: String,
    attachments: Vec<String>,
    edited_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            author_id: self.author_id,
            content: self.content,
            attachments: self.attachments,
            edited_at: self.edited_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthoredMessageRow {
    #[sqlx(flatten)]
    message: MessageRow,
    author_username: String,
    author_avatar_url: Option<String>,
}

impl AuthoredMessageRow {
    fn into_authored(self) -> AuthoredMessage {
        let author = MessageAuthor {
            id: self.message.author_id,
            username: self.author_username,
            avatar_url: self.author_avatar_url,
        };
        AuthoredMessage {
            message: self.message.into_message(),
            author,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn find_authored(&self, id: i64) -> Result<Option<AuthoredMessage>, AppError> {
        let row = sqlx::query_as::<_, AuthoredMessageRow>(&format!(
            "{} WHERE m.id = $1",
            AUTHORED_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AuthoredMessageRow::into_authored))
    }

    /// Find messages in a channel with keyset pagination.
    ///
    /// The limit is clamped to 1..=100.
    async fn find_by_channel(
        &self,
        channel_id: i64,
        before: Option<i64>,
        after: Option<i64>,
        limit: i64,
    ) -> Result<Vec<AuthoredMessage>, AppError> {
        let limit = limit.clamp(1, 100);

        let rows = match (before, after) {
            (Some(before_id), _) => {
                sqlx::query_as::<_, AuthoredMessageRow>(&format!(
                    "{} WHERE m.channel_id = $1 AND m.id < $2 ORDER BY m.id DESC LIMIT $3",
                    AUTHORED_SELECT
                ))
                .bind(channel_id)
                .bind(before_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(after_id)) => {
                sqlx::query_as::<_, AuthoredMessageRow>(&format!(
                    "{} WHERE m.channel_id = $1 AND m.id > $2 ORDER BY m.id ASC LIMIT $3",
                    AUTHORED_SELECT
                ))
                .bind(channel_id)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as::<_, AuthoredMessageRow>(&format!(
                    "{} WHERE m.channel_id = $1 ORDER BY m.id DESC LIMIT $2",
                    AUTHORED_SELECT
                ))
                .bind(channel_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(AuthoredMessageRow::into_authored).collect())
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (id, channel_id, author_id, content, attachments, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(message.channel_id)
        .bind(message.author_id)
        .bind(&message.content)
        .bind(&message.attachments)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Channel or author not found".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_message())
    }

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "UPDATE messages SET content = $2, edited_at = $3 WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(content)
        .bind(edited_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MessageRow::into_message)
            .ok_or_else(|| AppError::NotFound("Message not found".into()))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
