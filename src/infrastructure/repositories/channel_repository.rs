//! Channel Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Channel, ChannelRepository, ChannelType};
use crate::shared::error::AppError;

const CHANNEL_COLUMNS: &str =
    "id, server_id, name, type AS channel_type, description, pinned_message_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    server_id: i64,
    name: String,
    channel_type: String,
    description: String,
    pinned_message_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChannelRow {
    fn into_channel(self) -> Channel {
        Channel {
            id: self.id,
            server_id: self.server_id,
            name: self.name,
            channel_type: ChannelType::from_db(&self.channel_type),
            description: self.description,
            pinned_message_id: self.pinned_message_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL channel repository implementation.
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(&format!(
            "SELECT {} FROM channels WHERE id = $1",
            CHANNEL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ChannelRow::into_channel))
    }

    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(&format!(
            "SELECT {} FROM channels WHERE server_id = $1 ORDER BY id",
            CHANNEL_COLUMNS
        ))
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChannelRow::into_channel).collect())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(&format!(
            "SELECT {} FROM channels WHERE name ILIKE '%' || $1 || '%' ORDER BY name LIMIT $2",
            CHANNEL_COLUMNS
        ))
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChannelRow::into_channel).collect())
    }

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(&format!(
            r#"
            INSERT INTO channels (id, server_id, name, type, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {}
            "#,
            CHANNEL_COLUMNS
        ))
        .bind(channel.id)
        .bind(channel.server_id)
        .bind(&channel.name)
        .bind(channel.channel_type.as_str())
        .bind(&channel.description)
        .bind(channel.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_channel())
    }

    async fn update(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(&format!(
            r#"
            UPDATE channels SET name = $2, type = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CHANNEL_COLUMNS
        ))
        .bind(channel.id)
        .bind(&channel.name)
        .bind(channel.channel_type.as_str())
        .bind(&channel.description)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChannelRow::into_channel)
            .ok_or_else(|| AppError::NotFound("Channel not found".into()))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_pinned_message(
        &self,
        channel_id: i64,
        message_id: Option<i64>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE channels SET pinned_message_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(channel_id)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Channel not found".into()));
        }
        Ok(())
    }
}
