//! # cm-db-sqlite Implementation
//!
//! This module implements the data mapping between SQLite and the `cm-core`
//! domain models. Users are plain rows; each community is a single row whose
//! embedded collections are JSON arrays, updated in place by the statements
//! in `operators`.

mod operators;
mod schema;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cm_core::models::{Community, User};
use cm_core::traits::{CommunityRepo, UserRepo};
use cm_core::updates::CommunityUpdate;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use operators::{compile, Bind, Statement};

/// Pool sizing for `SqliteRepo::connect`.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

pub struct SqliteRepo {
    pool: SqlitePool,
}

// Helper for UUID conversion
pub(crate) fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> anyhow::Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("corrupt {column} document: {e}"))
}

impl SqliteRepo {
    /// Opens a pool with default sizing and bootstraps the schema.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, PoolSettings::default()).await
    }

    /// Opens a pool and bootstraps the schema.
    ///
    /// In-memory databases are pinned to a single connection that is never
    /// recycled, since each SQLite memory connection is its own database.
    pub async fn connect(url: &str, settings: PoolSettings) -> anyhow::Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = SqlitePoolOptions::new().acquire_timeout(settings.acquire_timeout);
        let pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(settings.max_connections)
        };
        let pool = pool_options.connect_with(options).await?;

        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready ({})", if in_memory { "in-memory" } else { "file" });

        Ok(Self { pool })
    }

    /// Closes every pooled connection. Call once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn community_from_row(row: &SqliteRow) -> anyhow::Result<Community> {
        Ok(Community {
            id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner: blob_to_uuid(&row.try_get::<Vec<u8>, _>("owner")?)?,
            members: json_column(row, "members")?,
            announcements: json_column(row, "announcements")?,
            events: json_column(row, "events")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
        Ok(User {
            id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn insert_user(&self, user: User) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                log::debug!("insert of user {} refused: email taken", user.id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::user_from_row)
            .transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::user_from_row)
            .transpose()
    }
}

#[async_trait]
impl CommunityRepo for SqliteRepo {
    async fn insert_community(&self, community: Community) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO communities (id, name, description, owner, members, announcements, events, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(community.id))
        .bind(&community.name)
        .bind(&community.description)
        .bind(uuid_to_blob(community.owner))
        .bind(serde_json::to_string(&community.members)?)
        .bind(serde_json::to_string(&community.announcements)?)
        .bind(serde_json::to_string(&community.events)?)
        .bind(community.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_community(&self, id: Uuid) -> anyhow::Result<Option<Community>> {
        sqlx::query("SELECT * FROM communities WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(Self::community_from_row)
            .transpose()
    }

    async fn list_by_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Community>> {
        let rows = sqlx::query(
            "SELECT * FROM communities \
             WHERE EXISTS (SELECT 1 FROM json_each(communities.members) \
                           WHERE json_extract(value, '$.id') = ?) \
             ORDER BY created_at, id",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::community_from_row).collect()
    }

    /// Literal, ASCII case-insensitive substring match on the name.
    async fn search_by_name(&self, query: &str) -> anyhow::Result<Vec<Community>> {
        let rows = sqlx::query(
            "SELECT * FROM communities \
             WHERE ? = '' OR instr(lower(name), lower(?)) > 0 \
             ORDER BY created_at, id",
        )
        .bind(query)
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::community_from_row).collect()
    }

    async fn apply(&self, community_id: Uuid, update: CommunityUpdate) -> anyhow::Result<bool> {
        let Statement { sql, binds } = compile(community_id, &update)?;

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = match bind {
                Bind::Text(value) => query.bind(value),
                Bind::Blob(value) => query.bind(value),
            };
        }
        let modified = query.execute(&self.pool).await?.rows_affected() > 0;
        log::debug!("{} on community {community_id}: modified={modified}", update.kind());
        Ok(modified)
    }
}
