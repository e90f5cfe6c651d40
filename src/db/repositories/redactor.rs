//! Redactor repository
//!
//! Database operations for redactor accounts.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{ListParams, NewRedactor, PagedResult, Redactor, RedactorChanges};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::in_placeholders;

const REDACTOR_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email, \
     is_staff, is_superuser, is_active, years_of_experience, date_joined, last_login";

const REDACTOR_COLUMNS_R: &str = "r.id, r.username, r.password_hash, r.first_name, r.last_name, \
     r.email, r.is_staff, r.is_superuser, r.is_active, r.years_of_experience, r.date_joined, \
     r.last_login";

/// Redactor repository trait
#[async_trait]
pub trait RedactorRepository: Send + Sync {
    async fn create(&self, redactor: &NewRedactor) -> Result<Redactor>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>>;

    /// Whether another redactor already uses `username`
    async fn exists_username(&self, username: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// One page of redactors in insertion order
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Redactor>>;

    async fn count(&self) -> Result<i64>;

    /// Apply changes; the password hash is only replaced when one is given
    async fn update(&self, id: i64, changes: &RedactorChanges) -> Result<Option<Redactor>>;

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Delete a redactor; returns false if nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Redactor>>;

    /// `(newspaper_id, publisher)` pairs for a batch of newspapers
    async fn get_for_newspapers(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Redactor)>>;
}

/// SQLx-based redactor repository implementation
pub struct SqlxRedactorRepository {
    pool: DynDatabasePool,
}

impl SqlxRedactorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RedactorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RedactorRepository for SqlxRedactorRepository {
    async fn create(&self, redactor: &NewRedactor) -> Result<Redactor> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_redactor_sqlite(pool, redactor).await,
            Backend::Mysql(pool) => create_redactor_mysql(pool, redactor).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Redactor>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_redactor_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_redactor_by_id_mysql(pool, id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<Redactor>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_redactor_by_username_sqlite(pool, username).await,
            Backend::Mysql(pool) => get_redactor_by_username_mysql(pool, username).await,
        }
    }

    async fn exists_username(&self, username: &str, exclude_id: Option<i64>) -> Result<bool> {
        // No real row has id 0, so it stands in for "exclude nothing"
        let exclude_id = exclude_id.unwrap_or(0);
        let sql = "SELECT COUNT(*) AS count FROM redactors WHERE username = ? AND id <> ?";
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(username)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check username")?
                .get("count"),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(username)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .context("Failed to check username")?
                .get("count"),
        };
        Ok(count > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Redactor>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_redactors_sqlite(pool, params).await,
            Backend::Mysql(pool) => list_redactors_mysql(pool, params).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => count_redactors_sqlite(pool).await,
            Backend::Mysql(pool) => count_redactors_mysql(pool).await,
        }
    }

    async fn update(&self, id: i64, changes: &RedactorChanges) -> Result<Option<Redactor>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                update_redactor_sqlite(pool, id, changes).await?;
                get_redactor_by_id_sqlite(pool, id).await
            }
            Backend::Mysql(pool) => {
                update_redactor_mysql(pool, id, changes).await?;
                get_redactor_by_id_mysql(pool, id).await
            }
        }
    }

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let sql = "UPDATE redactors SET last_login = ? WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql).bind(at).bind(id).execute(pool).await
                    .context("Failed to update last login")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql).bind(at).bind(id).execute(pool).await
                    .context("Failed to update last login")?;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // Sessions and newspaper_publishers rows cascade
        let sql = "DELETE FROM redactors WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql).bind(id).execute(pool).await
                .context("Failed to delete redactor")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql).bind(id).execute(pool).await
                .context("Failed to delete redactor")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<Redactor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_redactors_by_ids_sqlite(pool, ids).await,
            Backend::Mysql(pool) => get_redactors_by_ids_mysql(pool, ids).await,
        }
    }

    async fn get_for_newspapers(&self, newspaper_ids: &[i64]) -> Result<Vec<(i64, Redactor)>> {
        if newspaper_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_publishers_for_newspapers_sqlite(pool, newspaper_ids).await,
            Backend::Mysql(pool) => get_publishers_for_newspapers_mysql(pool, newspaper_ids).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_redactor_sqlite(pool: &SqlitePool, redactor: &NewRedactor) -> Result<Redactor> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO redactors (username, password_hash, first_name, last_name, email,
            is_staff, is_superuser, is_active, years_of_experience, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&redactor.username)
    .bind(&redactor.password_hash)
    .bind(&redactor.first_name)
    .bind(&redactor.last_name)
    .bind(&redactor.email)
    .bind(redactor.is_staff)
    .bind(redactor.is_superuser)
    .bind(redactor.is_active)
    .bind(redactor.years_of_experience)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create redactor")?;

    Ok(new_redactor_row(result.last_insert_rowid(), redactor, now))
}

async fn get_redactor_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE id = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by ID")?;

    Ok(row.map(|row| row_to_redactor_sqlite(&row)))
}

async fn get_redactor_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE username = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by username")?;

    Ok(row.map(|row| row_to_redactor_sqlite(&row)))
}

async fn list_redactors_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<PagedResult<Redactor>> {
    let total = count_redactors_sqlite(pool).await?;

    let sql = format!(
        "SELECT {} FROM redactors ORDER BY id LIMIT ? OFFSET ?",
        REDACTOR_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list redactors")?;

    let items = rows.iter().map(row_to_redactor_sqlite).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn count_redactors_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM redactors")
        .fetch_one(pool)
        .await
        .context("Failed to count redactors")?;

    Ok(row.get("count"))
}

async fn update_redactor_sqlite(pool: &SqlitePool, id: i64, changes: &RedactorChanges) -> Result<()> {
    let sql = update_sql(changes.password_hash.is_some());
    let mut query = sqlx::query(&sql)
        .bind(&changes.username)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .bind(changes.is_active)
        .bind(changes.years_of_experience);
    if let Some(hash) = &changes.password_hash {
        query = query.bind(hash);
    }
    query
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update redactor")?;

    Ok(())
}

async fn get_redactors_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Redactor>> {
    let sql = format!(
        "SELECT {} FROM redactors WHERE id IN ({}) ORDER BY username",
        REDACTOR_COLUMNS,
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get redactors by IDs")?;

    Ok(rows.iter().map(row_to_redactor_sqlite).collect())
}

async fn get_publishers_for_newspapers_sqlite(
    pool: &SqlitePool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Redactor)>> {
    let sql = format!(
        r#"
        SELECT np.newspaper_id, {}
        FROM newspaper_publishers np
        INNER JOIN redactors r ON r.id = np.redactor_id
        WHERE np.newspaper_id IN ({})
        ORDER BY r.username
        "#,
        REDACTOR_COLUMNS_R,
        in_placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get publishers for newspapers")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("newspaper_id"), row_to_redactor_sqlite(row)))
        .collect())
}

fn row_to_redactor_sqlite(row: &sqlx::sqlite::SqliteRow) -> Redactor {
    Redactor {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        years_of_experience: row.get("years_of_experience"),
        date_joined: row.get("date_joined"),
        last_login: row.get("last_login"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_redactor_mysql(pool: &MySqlPool, redactor: &NewRedactor) -> Result<Redactor> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO redactors (username, password_hash, first_name, last_name, email,
            is_staff, is_superuser, is_active, years_of_experience, date_joined)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&redactor.username)
    .bind(&redactor.password_hash)
    .bind(&redactor.first_name)
    .bind(&redactor.last_name)
    .bind(&redactor.email)
    .bind(redactor.is_staff)
    .bind(redactor.is_superuser)
    .bind(redactor.is_active)
    .bind(redactor.years_of_experience)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create redactor")?;

    Ok(new_redactor_row(result.last_insert_id() as i64, redactor, now))
}

async fn get_redactor_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE id = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by ID")?;

    Ok(row.map(|row| row_to_redactor_mysql(&row)))
}

async fn get_redactor_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<Redactor>> {
    let sql = format!("SELECT {} FROM redactors WHERE username = ?", REDACTOR_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get redactor by username")?;

    Ok(row.map(|row| row_to_redactor_mysql(&row)))
}

async fn list_redactors_mysql(pool: &MySqlPool, params: &ListParams) -> Result<PagedResult<Redactor>> {
    let total = count_redactors_mysql(pool).await?;

    let sql = format!(
        "SELECT {} FROM redactors ORDER BY id LIMIT ? OFFSET ?",
        REDACTOR_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list redactors")?;

    let items = rows.iter().map(row_to_redactor_mysql).collect();
    Ok(PagedResult::new(items, total, params))
}

async fn count_redactors_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM redactors")
        .fetch_one(pool)
        .await
        .context("Failed to count redactors")?;

    Ok(row.get("count"))
}

async fn update_redactor_mysql(pool: &MySqlPool, id: i64, changes: &RedactorChanges) -> Result<()> {
    let sql = update_sql(changes.password_hash.is_some());
    let mut query = sqlx::query(&sql)
        .bind(&changes.username)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .bind(changes.is_active)
        .bind(changes.years_of_experience);
    if let Some(hash) = &changes.password_hash {
        query = query.bind(hash);
    }
    query
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update redactor")?;

    Ok(())
}

async fn get_redactors_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<Redactor>> {
    let sql = format!(
        "SELECT {} FROM redactors WHERE id IN ({}) ORDER BY username",
        REDACTOR_COLUMNS,
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get redactors by IDs")?;

    Ok(rows.iter().map(row_to_redactor_mysql).collect())
}

async fn get_publishers_for_newspapers_mysql(
    pool: &MySqlPool,
    newspaper_ids: &[i64],
) -> Result<Vec<(i64, Redactor)>> {
    let sql = format!(
        r#"
        SELECT np.newspaper_id, {}
        FROM newspaper_publishers np
        INNER JOIN redactors r ON r.id = np.redactor_id
        WHERE np.newspaper_id IN ({})
        ORDER BY r.username
        "#,
        REDACTOR_COLUMNS_R,
        in_placeholders(newspaper_ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in newspaper_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get publishers for newspapers")?;

    Ok(rows
        .iter()
        .map(|row| (row.get("newspaper_id"), row_to_redactor_mysql(row)))
        .collect())
}

fn row_to_redactor_mysql(row: &sqlx::mysql::MySqlRow) -> Redactor {
    Redactor {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        years_of_experience: row.get("years_of_experience"),
        date_joined: row.get("date_joined"),
        last_login: row.get("last_login"),
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn update_sql(with_password: bool) -> String {
    format!(
        "UPDATE redactors SET username = ?, first_name = ?, last_name = ?, email = ?, \
         is_staff = ?, is_superuser = ?, is_active = ?, years_of_experience = ?{} WHERE id = ?",
        if with_password { ", password_hash = ?" } else { "" }
    )
}

fn new_redactor_row(id: i64, redactor: &NewRedactor, date_joined: DateTime<Utc>) -> Redactor {
    Redactor {
        id,
        username: redactor.username.clone(),
        password_hash: redactor.password_hash.clone(),
        first_name: redactor.first_name.clone(),
        last_name: redactor.last_name.clone(),
        email: redactor.email.clone(),
        is_staff: redactor.is_staff,
        is_superuser: redactor.is_superuser,
        is_active: redactor.is_active,
        years_of_experience: redactor.years_of_experience,
        date_joined,
        last_login: None,
    }
}
