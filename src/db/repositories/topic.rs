//! Topic repository
//!
//! Database operations for topics and their newspaper links.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{ListParams, PagedResult, Topic, TopicOrdering};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::in_placeholders;

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Insert a topic; a duplicate name fails with the database's unique violation
    async fn create(&self, name: &str) -> Result<Topic>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Topic>>;

    /// One page of topics in the requested order
    async fn list(&self, params: &ListParams, ordering: TopicOrdering) -> Result<PagedResult<Topic>>;

    async fn count(&self) -> Result<i64>;

    /// Rename a topic, returning the stored row (None if the id is unknown)
    async fn update(&self, id: i64, name: &str) -> Result<Option<Topic>>;

    /// Delete a topic; returns false if nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Topics with the given ids, ordered by name
    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Topic>>;

    /// `(newspaper_id, topic)` pairs for a batch of newspapers
    async fn get_for_newspapers(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>>;
}

/// SQLx-based topic repository implementation
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn create(&self, name: &str) -> Result<Topic> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_topic_sqlite(pool, name).await,
            Backend::Mysql(pool) => create_topic_mysql(pool, name).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_topic_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_topic_by_id_mysql(pool, id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Topic>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_topic_by_name_sqlite(pool, name).await,
            Backend::Mysql(pool) => get_topic_by_name_mysql(pool, name).await,
        }
    }

    async fn list(&self, params: &ListParams, ordering: TopicOrdering) -> Result<PagedResult<Topic>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_topics_sqlite(pool, params, ordering).await,
            Backend::Mysql(pool) => list_topics_mysql(pool, params, ordering).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => count_topics_sqlite(pool).await,
            Backend::Mysql(pool) => count_topics_mysql(pool).await,
        }
    }

    async fn update(&self, id: i64, name: &str) -> Result<Option<Topic>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                update_topic_sqlite(pool, id, name).await?;
                get_topic_by_id_sqlite(pool, id).await
            }
            Backend::Mysql(pool) => {
                update_topic_mysql(pool, id, name).await?;
                get_topic_by_id_mysql(pool, id).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_topic_sqlite(pool, id).await,
            Backend::Mysql(pool) => delete_topic_mysql(pool, id).await,
        }
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Topic>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_topics_by_ids_sqlite(pool, ids).await,
            Backend::Mysql(pool) => get_topics_by_ids_mysql(pool, ids).await,
        }
    }

    async fn get_for_newspapers(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Topic)>> {
        if newspaper_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_topics_for_newspapers_sqlite(pool, newspaper_ids).await,
            Backend::Mysql(pool) => get_topics_for_newspapers_mysql(pool, newspaper_ids).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_topic_sqlite(pool: &SqlitePool, name: &str) -> Result<Topic> {
    let result = sqlx::query("INSERT INTO topics (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

async fn get_topic_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.map(|row| row_to_topic_sqlite(&row)))
}

async fn get_topic_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by name")?;

    Ok(row.map(|row| row_to_topic_sqlite(&row)))
}

async fn list_topics_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
    ordering: TopicOrdering,
) -> Result<PagedResult<Topic>> {
    let total = count_topics_sqlite(pool).await?;

    let sql = format!(
        "SELECT id, name FROM topics ORDER BY {} LIMIT ? OFFSET ?",
        ordering.order_by()
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    let items = rows.iter().map(row_to_topic_sqlite).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn count_topics_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_sqlite(pool: &SqlitePool, id: i64, name: &str) -> Result<()> {
    sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update topic")?;

    Ok(())
}

async fn delete_topic_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // newspaper_topics rows go with it through ON DELETE CASCADE
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(result.rows_affected() > 0)
}

async fn get_topics_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Topic>> {
    let sql = format!(
        "SELECT id, name FROM topics WHERE id IN ({}) ORDER BY name",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics by IDs")?;

    Ok(rows.iter().map(row_to_topic_sqlite).collect())
}

async fn get_topics_for_newspapers_sqlite(
    pool: &SqlitePool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Topic)>> {
    let sql = format!(
        r#"
        SELECT nt.newspaper_id, t.id, t.name
        FROM newspaper_topics nt
        INNER JOIN topics t ON t.id = nt.topic_id
        WHERE nt.newspaper_id IN ({})
        ORDER BY t.name
        "#,
        in_placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics for newspapers")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("newspaper_id"), row_to_topic_sqlite(row)))
        .collect())
}

fn row_to_topic_sqlite(row: &sqlx::sqlite::SqliteRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_topic_mysql(pool: &MySqlPool, name: &str) -> Result<Topic> {
    let result = sqlx::query("INSERT INTO topics (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_id() as i64,
        name: name.to_string(),
    })
}

async fn get_topic_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by ID")?;

    Ok(row.map(|row| row_to_topic_mysql(&row)))
}

async fn get_topic_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Topic>> {
    let row = sqlx::query("SELECT id, name FROM topics WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get topic by name")?;

    Ok(row.map(|row| row_to_topic_mysql(&row)))
}

async fn list_topics_mysql(
    pool: &MySqlPool,
    params: &ListParams,
    ordering: TopicOrdering,
) -> Result<PagedResult<Topic>> {
    let total = count_topics_mysql(pool).await?;

    let sql = format!(
        "SELECT id, name FROM topics ORDER BY {} LIMIT ? OFFSET ?",
        ordering.order_by()
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list topics")?;

    let items = rows.iter().map(row_to_topic_mysql).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn count_topics_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_mysql(pool: &MySqlPool, id: i64, name: &str) -> Result<()> {
    sqlx::query("UPDATE topics SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update topic")?;

    Ok(())
}

async fn delete_topic_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(result.rows_affected() > 0)
}

async fn get_topics_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<Topic>> {
    let sql = format!(
        "SELECT id, name FROM topics WHERE id IN ({}) ORDER BY name",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics by IDs")?;

    Ok(rows.iter().map(row_to_topic_mysql).collect())
}

async fn get_topics_for_newspapers_mysql(
    pool: &MySqlPool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Topic)>> {
    let sql = format!(
        r#"
        SELECT nt.newspaper_id, t.id, t.name
        FROM newspaper_topics nt
        INNER JOIN topics t ON t.id = nt.topic_id
        WHERE nt.newspaper_id IN ({})
        ORDER BY t.name
        "#,
        in_placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get topics for newspapers")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("newspaper_id"), row_to_topic_mysql(row)))
        .collect())
}

fn row_to_topic_mysql(row: &sqlx::mysql::MySqlRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
    }
}
