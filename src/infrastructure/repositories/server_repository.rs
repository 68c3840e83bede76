//! Server Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChannelMessageCount, Server, ServerInvite, ServerRepository};
use crate::shared::error::AppError;

const SERVER_COLUMNS: &str = "id, name, icon_url, owner_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ServerRow {
    id: i64,
    name: String,
    icon_url: Option<String>,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ServerRow> for Server {
    fn from(row: ServerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            icon_url: row.icon_url,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    code: String,
    server_id: i64,
    inviter_id: i64,
    created_at: DateTime<Utc>,
}

impl From<InviteRow> for ServerInvite {
    fn from(row: InviteRow) -> Self {
        Self {
            code: row.code,
            server_id: row.server_id,
            inviter_id: row.inviter_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageCountRow {
    channel_id: i64,
    message_count: i64,
}

/// PostgreSQL server repository implementation.
#[derive(Clone)]
pub struct PgServerRepository {
    pool: PgPool,
}

impl PgServerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerRepository for PgServerRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Server>, AppError> {
        let row = sqlx::query_as::<_, ServerRow>(&format!(
            "SELECT {} FROM servers WHERE id = $1",
            SERVER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Server::from))
    }

    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Server>, AppError> {
        let rows = sqlx::query_as::<_, ServerRow>(
            r#"
            SELECT s.id, s.name, s.icon_url, s.owner_id, s.created_at, s.updated_at
            FROM servers s
            JOIN server_members m ON m.server_id = s.id
            WHERE m.user_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Server::from).collect())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Server>, AppError> {
        let rows = sqlx::query_as::<_, ServerRow>(&format!(
            "SELECT {} FROM servers WHERE name ILIKE '%' || $1 || '%' ORDER BY name LIMIT $2",
            SERVER_COLUMNS
        ))
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Server::from).collect())
    }

    async fn create(&self, server: &Server) -> Result<Server, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ServerRow>(&format!(
            r#"
            INSERT INTO servers (id, name, icon_url, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            SERVER_COLUMNS
        ))
        .bind(server.id)
        .bind(&server.name)
        .bind(&server.icon_url)
        .bind(server.owner_id)
        .bind(server.created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO server_members (server_id, user_id, joined_at) VALUES ($1, $2, $3)")
            .bind(server.id)
            .bind(server.owner_id)
            .bind(server.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update(&self, server: &Server) -> Result<Server, AppError> {
        let row = sqlx::query_as::<_, ServerRow>(&format!(
            r#"
            UPDATE servers SET name = $2, icon_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SERVER_COLUMNS
        ))
        .bind(server.id)
        .bind(&server.name)
        .bind(&server.icon_url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Server::from)
            .ok_or_else(|| AppError::NotFound("Server not found".into()))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM servers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn add_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO server_members (server_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(server_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError> {
        let found: Option<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM server_members WHERE server_id = $1 AND user_id = $2",
        )
        .bind(server_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn member_ids(&self, server_id: i64) -> Result<Vec<i64>, AppError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM server_members WHERE server_id = $1 ORDER BY joined_at, user_id",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn create_invite(&self, invite: &ServerInvite) -> Result<ServerInvite, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(
            r#"
            INSERT INTO server_invites (code, server_id, inviter_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING code, server_id, inviter_id, created_at
            "#,
        )
        .bind(&invite.code)
        .bind(invite.server_id)
        .bind(invite.inviter_id)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_invite(&self, code: &str) -> Result<Option<ServerInvite>, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(
            "SELECT code, server_id, inviter_id, created_at FROM server_invites WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ServerInvite::from))
    }

    async fn channel_message_counts(&self, server_id: i64) -> Result<Vec<ChannelMessageCount>, AppError> {
        let rows = sqlx::query_as::<_, MessageCountRow>(
            r#"
            SELECT c.id AS channel_id, COUNT(m.id) AS message_count
            FROM channels c
            LEFT JOIN messages m ON m.channel_id = c.id
            WHERE c.server_id = $1
            GROUP BY c.id
            ORDER BY c.id
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ChannelMessageCount {
                channel_id: row.channel_id,
                message_count: row.message_count,
            })
            .collect())
    }
}
