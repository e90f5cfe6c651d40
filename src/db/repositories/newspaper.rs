//! Newspaper repository
//!
//! Database operations for newspapers. Writes touch the base row and both
//! relation tables, so they run inside a single transaction. Reads load the
//! topics and publishers for a whole batch of newspapers at once.

use crate::db::{like_pattern, Backend, DynDatabasePool};
use crate::models::{ListParams, Newspaper, NewspaperInput, PagedResult, Redactor, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    in_placeholders, RedactorRepository, SqlxRedactorRepository, SqlxTopicRepository,
    TopicRepository,
};

/// Relations a newspaper read can attach
pub const NEWSPAPER_RELATIONS: &[&str] = &["topics", "publishers"];

/// Newspaper repository trait
#[async_trait]
pub trait NewspaperRepository: Send + Sync {
    /// Insert a newspaper together with its topic and publisher links
    async fn create(&self, input: &NewspaperInput) -> Result<Newspaper>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Newspaper>>;

    /// One page of newspapers in insertion order, optionally filtered by a
    /// case-insensitive title fragment
    async fn list(&self, params: &ListParams, title: Option<&str>) -> Result<PagedResult<Newspaper>>;

    async fn count(&self) -> Result<i64>;

    /// Replace the fields and both relation sets; None if the id is unknown
    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Option<Newspaper>>;

    /// Delete a newspaper; returns false if nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Newspapers a redactor is listed as publisher of, newest first
    async fn list_by_publisher(&self, redactor_id: i64) -> Result<Vec<Newspaper>>;

    /// Newspapers with the given ids, in the order of `ids`. Only the named
    /// `relations` are loaded; the others are left empty.
    async fn get_by_ids(&self, ids: &[i64], relations: &[&str]) -> Result<Vec<Newspaper>>;
}

/// SQLx-based newspaper repository implementation
pub struct SqlxNewspaperRepository {
    pool: DynDatabasePool,
    topics: SqlxTopicRepository,
    publishers: SqlxRedactorRepository,
}

impl SqlxNewspaperRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            topics: SqlxTopicRepository::new(pool.clone()),
            publishers: SqlxRedactorRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewspaperRepository> {
        Arc::new(Self::new(pool))
    }

    /// Attach the named relations to base rows, one batched query each
    async fn with_relations(
        &self,
        rows: Vec<NewspaperRow>,
        relations: &[&str],
    ) -> Result<Vec<Newspaper>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let mut topics: HashMap<i64, Vec<Topic>> = HashMap::new();
        if relations.contains(&"topics") {
            for (newspaper_id, topic) in self.topics.get_for_newspapers(&ids).await? {
                topics.entry(newspaper_id).or_default().push(topic);
            }
        }

        let mut publishers: HashMap<i64, Vec<Redactor>> = HashMap::new();
        if relations.contains(&"publishers") {
            for (newspaper_id, redactor) in self.publishers.get_for_newspapers(&ids).await? {
                publishers.entry(newspaper_id).or_default().push(redactor);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| Newspaper {
                topics: topics.remove(&row.id).unwrap_or_default(),
                publishers: publishers.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                content: row.content,
                published_date: row.published_date,
            })
            .collect())
    }

    async fn first_with_relations(&self, row: Option<NewspaperRow>) -> Result<Option<Newspaper>> {
        match row {
            Some(row) => Ok(self.with_relations(vec![row], NEWSPAPER_RELATIONS).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Base columns of a newspaper row, before relations are attached
struct NewspaperRow {
    id: i64,
    title: String,
    content: String,
    published_date: NaiveDate,
}

#[async_trait]
impl NewspaperRepository for SqlxNewspaperRepository {
    async fn create(&self, input: &NewspaperInput) -> Result<Newspaper> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_newspaper_sqlite(pool, input).await?,
            Backend::Mysql(pool) => create_newspaper_mysql(pool, input).await?,
        };
        self.get_by_id(id)
            .await?
            .context("Newspaper vanished right after insert")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Newspaper>> {
        let row = match self.pool.backend() {
            Backend::Sqlite(pool) => get_newspaper_row_sqlite(pool, id).await?,
            Backend::Mysql(pool) => get_newspaper_row_mysql(pool, id).await?,
        };
        self.first_with_relations(row).await
    }

    async fn list(&self, params: &ListParams, title: Option<&str>) -> Result<PagedResult<Newspaper>> {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let (rows, total) = match self.pool.backend() {
            Backend::Sqlite(pool) => list_newspaper_rows_sqlite(pool, params, title).await?,
            Backend::Mysql(pool) => list_newspaper_rows_mysql(pool, params, title).await?,
        };
        let items = self.with_relations(rows, NEWSPAPER_RELATIONS).await?;
        Ok(PagedResult::new(items, total, params))
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM newspapers";
        let count = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .fetch_one(pool)
                .await
                .context("Failed to count newspapers")?
                .get("count"),
            Backend::Mysql(pool) => sqlx::query(sql)
                .fetch_one(pool)
                .await
                .context("Failed to count newspapers")?
                .get("count"),
        };
        Ok(count)
    }

    async fn update(&self, id: i64, input: &NewspaperInput) -> Result<Option<Newspaper>> {
        let found = match self.pool.backend() {
            Backend::Sqlite(pool) => update_newspaper_sqlite(pool, id, input).await?,
            Backend::Mysql(pool) => update_newspaper_mysql(pool, id, input).await?,
        };
        if !found {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM newspapers WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete newspaper")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete newspaper")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list_by_publisher(&self, redactor_id: i64) -> Result<Vec<Newspaper>> {
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => list_rows_by_publisher_sqlite(pool, redactor_id).await?,
            Backend::Mysql(pool) => list_rows_by_publisher_mysql(pool, redactor_id).await?,
        };
        self.with_relations(rows, NEWSPAPER_RELATIONS).await
    }

    async fn get_by_ids(&self, ids: &[i64], relations: &[&str]) -> Result<Vec<Newspaper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = match self.pool.backend() {
            Backend::Sqlite(pool) => get_rows_by_ids_sqlite(pool, ids).await?,
            Backend::Mysql(pool) => get_rows_by_ids_mysql(pool, ids).await?,
        };
        let mut by_id: HashMap<i64, Newspaper> = self
            .with_relations(rows, relations)
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_newspaper_sqlite(pool: &SqlitePool, input: &NewspaperInput) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query("INSERT INTO newspapers (title, content, published_date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published_date)
        .execute(&mut *tx)
        .await
        .context("Failed to create newspaper")?
        .last_insert_rowid();

    insert_relations_sqlite(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(id)
}

async fn update_newspaper_sqlite(pool: &SqlitePool, id: i64, input: &NewspaperInput) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let exists = sqlx::query("SELECT id FROM newspapers WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to get newspaper by ID")?
        .is_some();
    if !exists {
        return Ok(false);
    }

    sqlx::query("UPDATE newspapers SET title = ?, content = ?, published_date = ? WHERE id = ?")
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published_date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update newspaper")?;

    sqlx::query("DELETE FROM newspaper_topics WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper topics")?;
    sqlx::query("DELETE FROM newspaper_publishers WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper publishers")?;

    insert_relations_sqlite(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(true)
}

async fn insert_relations_sqlite(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    newspaper_id: i64,
    input: &NewspaperInput,
) -> Result<()> {
    for topic_id in dedup(&input.topic_ids) {
        sqlx::query("INSERT OR IGNORE INTO newspaper_topics (newspaper_id, topic_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(topic_id)
            .execute(&mut **tx)
            .await
            .context("Failed to add topic to newspaper")?;
    }
    for redactor_id in dedup(&input.publisher_ids) {
        sqlx::query(
            "INSERT OR IGNORE INTO newspaper_publishers (newspaper_id, redactor_id) VALUES (?, ?)",
        )
        .bind(newspaper_id)
        .bind(redactor_id)
        .execute(&mut **tx)
        .await
        .context("Failed to add publisher to newspaper")?;
    }
    Ok(())
}

async fn get_newspaper_row_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<NewspaperRow>> {
    let row = sqlx::query("SELECT id, title, content, published_date FROM newspapers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get newspaper by ID")?;

    Ok(row.map(|row| row_to_newspaper_sqlite(&row)))
}

async fn list_newspaper_rows_sqlite(
    pool: &SqlitePool,
    params: &ListParams,
    title: Option<&str>,
) -> Result<(Vec<NewspaperRow>, i64)> {
    let filter = if title.is_some() {
        "WHERE LOWER(title) LIKE LOWER(?) ESCAPE '!'"
    } else {
        ""
    };

    let count_sql = format!("SELECT COUNT(*) AS count FROM newspapers {}", filter);
    let mut count_query = sqlx::query(&count_sql);
    if let Some(title) = title {
        count_query = count_query.bind(like_pattern(title));
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count newspapers")?
        .get("count");

    let sql = format!(
        "SELECT id, title, content, published_date FROM newspapers {} ORDER BY id LIMIT ? OFFSET ?",
        filter
    );
    let mut query = sqlx::query(&sql);
    if let Some(title) = title {
        query = query.bind(like_pattern(title));
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list newspapers")?;

    Ok((rows.iter().map(row_to_newspaper_sqlite).collect(), total))
}

async fn list_rows_by_publisher_sqlite(pool: &SqlitePool, redactor_id: i64) -> Result<Vec<NewspaperRow>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_publishers np ON np.newspaper_id = n.id
        WHERE np.redactor_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(redactor_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by publisher")?;

    Ok(rows.iter().map(row_to_newspaper_sqlite).collect())
}

async fn get_rows_by_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<NewspaperRow>> {
    let sql = format!(
        "SELECT id, title, content, published_date FROM newspapers WHERE id IN ({})",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get newspapers by IDs")?;

    Ok(rows.iter().map(row_to_newspaper_sqlite).collect())
}

fn row_to_newspaper_sqlite(row: &sqlx::sqlite::SqliteRow) -> NewspaperRow {
    NewspaperRow {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published_date: row.get("published_date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_newspaper_mysql(pool: &MySqlPool, input: &NewspaperInput) -> Result<i64> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let id = sqlx::query("INSERT INTO newspapers (title, content, published_date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published_date)
        .execute(&mut *tx)
        .await
        .context("Failed to create newspaper")?
        .last_insert_id() as i64;

    insert_relations_mysql(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(id)
}

async fn update_newspaper_mysql(pool: &MySqlPool, id: i64, input: &NewspaperInput) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let exists = sqlx::query("SELECT id FROM newspapers WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to get newspaper by ID")?
        .is_some();
    if !exists {
        return Ok(false);
    }

    sqlx::query("UPDATE newspapers SET title = ?, content = ?, published_date = ? WHERE id = ?")
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.published_date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update newspaper")?;

    sqlx::query("DELETE FROM newspaper_topics WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper topics")?;
    sqlx::query("DELETE FROM newspaper_publishers WHERE newspaper_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear newspaper publishers")?;

    insert_relations_mysql(&mut tx, id, input).await?;

    tx.commit().await.context("Failed to commit newspaper")?;
    Ok(true)
}

async fn insert_relations_mysql(
    tx: &mut sqlx::Transaction<'_, sqlx::MySql>,
    newspaper_id: i64,
    input: &NewspaperInput,
) -> Result<()> {
    for topic_id in dedup(&input.topic_ids) {
        sqlx::query("INSERT IGNORE INTO newspaper_topics (newspaper_id, topic_id) VALUES (?, ?)")
            .bind(newspaper_id)
            .bind(topic_id)
            .execute(&mut **tx)
            .await
            .context("Failed to add topic to newspaper")?;
    }
    for redactor_id in dedup(&input.publisher_ids) {
        sqlx::query(
            "INSERT IGNORE INTO newspaper_publishers (newspaper_id, redactor_id) VALUES (?, ?)",
        )
        .bind(newspaper_id)
        .bind(redactor_id)
        .execute(&mut **tx)
        .await
        .context("Failed to add publisher to newspaper")?;
    }
    Ok(())
}

async fn get_newspaper_row_mysql(pool: &MySqlPool, id: i64) -> Result<Option<NewspaperRow>> {
    let row = sqlx::query("SELECT id, title, content, published_date FROM newspapers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get newspaper by ID")?;

    Ok(row.map(|row| row_to_newspaper_mysql(&row)))
}

async fn list_newspaper_rows_mysql(
    pool: &MySqlPool,
    params: &ListParams,
    title: Option<&str>,
) -> Result<(Vec<NewspaperRow>, i64)> {
    let filter = if title.is_some() {
        "WHERE LOWER(title) LIKE LOWER(?) ESCAPE '!'"
    } else {
        ""
    };

    let count_sql = format!("SELECT COUNT(*) AS count FROM newspapers {}", filter);
    let mut count_query = sqlx::query(&count_sql);
    if let Some(title) = title {
        count_query = count_query.bind(like_pattern(title));
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count newspapers")?
        .get("count");

    let sql = format!(
        "SELECT id, title, content, published_date FROM newspapers {} ORDER BY id LIMIT ? OFFSET ?",
        filter
    );
    let mut query = sqlx::query(&sql);
    if let Some(title) = title {
        query = query.bind(like_pattern(title));
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list newspapers")?;

    Ok((rows.iter().map(row_to_newspaper_mysql).collect(), total))
}

async fn list_rows_by_publisher_mysql(pool: &MySqlPool, redactor_id: i64) -> Result<Vec<NewspaperRow>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.title, n.content, n.published_date
        FROM newspapers n
        INNER JOIN newspaper_publishers np ON np.newspaper_id = n.id
        WHERE np.redactor_id = ?
        ORDER BY n.published_date DESC, n.id DESC
        "#,
    )
    .bind(redactor_id)
    .fetch_all(pool)
    .await
    .context("Failed to list newspapers by publisher")?;

    Ok(rows.iter().map(row_to_newspaper_mysql).collect())
}

async fn get_rows_by_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<NewspaperRow>> {
    let sql = format!(
        "SELECT id, title, content, published_date FROM newspapers WHERE id IN ({})",
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to get newspapers by IDs")?;

    Ok(rows.iter().map(row_to_newspaper_mysql).collect())
}

fn row_to_newspaper_mysql(row: &sqlx::mysql::MySqlRow) -> NewspaperRow {
    NewspaperRow {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        published_date: row.get("published_date"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::NewRedactor;

    struct Fixture {
        repo: SqlxNewspaperRepository,
        topics: SqlxTopicRepository,
        redactors: SqlxRedactorRepository,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Fixture {
            repo: SqlxNewspaperRepository::new(pool.clone()),
            topics: SqlxTopicRepository::new(pool.clone()),
            redactors: SqlxRedactorRepository::new(pool),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_with_relations() {
        let f = setup().await;
        let topic = f.topics.create("Politics").await.unwrap();
        let author = f
            .redactors
            .create(&NewRedactor::new("jane", "hash"))
            .await
            .unwrap();

        let mut input = NewspaperInput::new("Election", "Results are in", date(2023, 11, 5));
        input.topic_ids = vec![topic.id, topic.id];
        input.publisher_ids = vec![author.id];
        let created = f.repo.create(&input).await.expect("Failed to create newspaper");

        assert_eq!(created.title, "Election");
        assert_eq!(created.published_date, date(2023, 11, 5));
        assert_eq!(created.topic_ids(), vec![topic.id]);
        assert_eq!(created.publisher_ids(), vec![author.id]);
    }

    #[tokio::test]
    async fn test_create_with_unknown_topic_rolls_back() {
        let f = setup().await;

        let mut input = NewspaperInput::new("Orphan", "Body", date(2024, 1, 1));
        input.topic_ids = vec![4242];
        let result = f.repo.create(&input).await;

        assert!(result.is_err());
        assert_eq!(f.repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_relations() {
        let f = setup().await;
        let old = f.topics.create("Old").await.unwrap();
        let new = f.topics.create("New").await.unwrap();

        let mut input = NewspaperInput::new("Story", "Body", date(2024, 1, 1));
        input.topic_ids = vec![old.id];
        let created = f.repo.create(&input).await.unwrap();

        input.title = "Story, revised".to_string();
        input.topic_ids = vec![new.id];
        let updated = f.repo.update(created.id, &input).await.unwrap().unwrap();

        assert_eq!(updated.title, "Story, revised");
        assert_eq!(updated.topic_ids(), vec![new.id]);
        assert!(f.repo.update(9999, &input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_title_case_insensitively() {
        let f = setup().await;
        for i in 0..3 {
            let input = NewspaperInput::new(format!("Newspaper {}", i), "Body", date(2024, 1, 1));
            f.repo.create(&input).await.unwrap();
        }
        f.repo
            .create(&NewspaperInput::new("100% Sport", "Body", date(2024, 1, 2)))
            .await
            .unwrap();

        let params = ListParams::new(1, 5);
        let exact = f.repo.list(&params, Some("Newspaper 0")).await.unwrap();
        assert_eq!(exact.total, 1);
        assert_eq!(exact.items[0].title, "Newspaper 0");

        let fragment = f.repo.list(&params, Some("newsPAPER")).await.unwrap();
        assert_eq!(fragment.total, 3);

        let percent = f.repo.list(&params, Some("0%")).await.unwrap();
        assert_eq!(percent.items.len(), 1);
        assert_eq!(percent.items[0].title, "100% Sport");

        let all = f.repo.list(&params, Some("   ")).await.unwrap();
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn test_deleting_topic_keeps_newspaper() {
        let f = setup().await;
        let topic = f.topics.create("Weather").await.unwrap();
        let mut input = NewspaperInput::new("Storm", "Heavy rain", date(2024, 2, 2));
        input.topic_ids = vec![topic.id];
        let created = f.repo.create(&input).await.unwrap();

        f.topics.delete(topic.id).await.unwrap();

        let after = f.repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(after.topics.is_empty());
        assert_eq!(after.title, "Storm");
        assert_eq!(after.content, "Heavy rain");
        assert_eq!(after.published_date, date(2024, 2, 2));
    }

    #[tokio::test]
    async fn test_list_by_publisher_and_get_by_ids() {
        let f = setup().await;
        let author = f
            .redactors
            .create(&NewRedactor::new("jane", "hash"))
            .await
            .unwrap();
        let mut input = NewspaperInput::new("Mine", "Body", date(2024, 1, 1));
        input.publisher_ids = vec![author.id];
        let mine = f.repo.create(&input).await.unwrap();
        let other = f
            .repo
            .create(&NewspaperInput::new("Other", "Body", date(2024, 1, 1)))
            .await
            .unwrap();

        let by_author = f.repo.list_by_publisher(author.id).await.unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].id, mine.id);

        let ordered = f
            .repo
            .get_by_ids(&[other.id, mine.id], NEWSPAPER_RELATIONS)
            .await
            .unwrap();
        let titles: Vec<_> = ordered.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Other", "Mine"]);
        assert_eq!(ordered[1].publishers.len(), 1);

        let bare = f.repo.get_by_ids(&[mine.id], &["topics"]).await.unwrap();
        assert!(bare[0].publishers.is_empty());

        assert!(f.repo.delete(mine.id).await.unwrap());
        assert!(f.repo.list_by_publisher(author.id).await.unwrap().is_empty());
    }
}
