//! Admin query repository
//!
//! Generic changelist queries driven by the admin configuration table.
//! Table and column names always come from `'static` configuration; only the
//! user-supplied search terms and filter values are bound as parameters.

use crate::db::{like_pattern, Backend, DynDatabasePool};
use crate::models::{ListParams, PagedResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// One active changelist filter
#[derive(Debug, Clone, PartialEq)]
pub enum AdminFilter {
    /// Rows whose date column falls in `year`
    Year { column: &'static str, year: i32 },
    /// Rows linked to `value` through a join table
    Related {
        join_table: &'static str,
        owner_column: &'static str,
        join_column: &'static str,
        value: i64,
    },
    /// Rows whose flag column equals `value`
    Boolean { column: &'static str, value: bool },
}

/// A changelist query: search, filters, ordering and paging for one table
#[derive(Debug, Clone)]
pub struct AdminQuery {
    pub table: &'static str,
    pub search_fields: &'static [&'static str],
    pub search: Option<String>,
    pub filters: Vec<AdminFilter>,
    /// Column names, `-` prefix for descending
    pub ordering: &'static [&'static str],
    pub params: ListParams,
}

impl AdminQuery {
    pub fn new(table: &'static str, params: ListParams) -> Self {
        Self {
            table,
            search_fields: &[],
            search: None,
            filters: Vec::new(),
            ordering: &["-id"],
            params,
        }
    }

    /// WHERE clause plus its bind values for the given backend
    fn where_clause(&self, driver: Driver) -> (String, Vec<BindValue>) {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(search) = &self.search {
            if !self.search_fields.is_empty() {
                // Every term must match at least one search field
                for term in search.split_whitespace() {
                    let ors: Vec<String> = self
                        .search_fields
                        .iter()
                        .map(|field| {
                            binds.push(BindValue::Text(like_pattern(term)));
                            format!("LOWER({}) LIKE LOWER(?) ESCAPE '!'", field)
                        })
                        .collect();
                    clauses.push(format!("({})", ors.join(" OR ")));
                }
            }
        }

        for filter in &self.filters {
            match filter {
                AdminFilter::Year { column, year } => match driver {
                    Driver::Sqlite => {
                        clauses.push(format!("strftime('%Y', {}) = ?", column));
                        binds.push(BindValue::Text(format!("{:04}", year)));
                    }
                    Driver::Mysql => {
                        clauses.push(format!("YEAR({}) = ?", column));
                        binds.push(BindValue::Int(*year as i64));
                    }
                },
                AdminFilter::Related {
                    join_table,
                    owner_column,
                    join_column,
                    value,
                } => {
                    clauses.push(format!(
                        "id IN (SELECT {} FROM {} WHERE {} = ?)",
                        owner_column, join_table, join_column
                    ));
                    binds.push(BindValue::Int(*value));
                }
                AdminFilter::Boolean { column, value } => {
                    clauses.push(format!("{} = ?", column));
                    binds.push(BindValue::Bool(*value));
                }
            }
        }

        if clauses.is_empty() {
            (String::new(), binds)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), binds)
        }
    }

    fn order_clause(&self) -> String {
        let mut parts: Vec<String> = self
            .ordering
            .iter()
            .map(|field| match field.strip_prefix('-') {
                Some(column) => format!("{} DESC", column),
                None => format!("{} ASC", field),
            })
            .collect();
        if parts.is_empty() {
            parts.push("id DESC".to_string());
        }
        format!(" ORDER BY {}", parts.join(", "))
    }

    fn count_sql(&self, where_clause: &str) -> String {
        format!("SELECT COUNT(*) FROM {}{}", self.table, where_clause)
    }

    fn ids_sql(&self, where_clause: &str) -> String {
        format!(
            "SELECT id FROM {}{}{} LIMIT ? OFFSET ?",
            self.table,
            where_clause,
            self.order_clause()
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Driver {
    Sqlite,
    Mysql,
}

#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// Admin query repository trait
#[async_trait]
pub trait AdminQueryRepository: Send + Sync {
    /// One page of matching ids, in the configured ordering
    async fn search_ids(&self, query: &AdminQuery) -> Result<PagedResult<i64>>;

    /// Distinct years present in a date column, newest first
    async fn distinct_years(&self, table: &'static str, column: &'static str) -> Result<Vec<i32>>;

    /// `(id, label)` pairs for a filter sidebar or a multi-select widget
    async fn choices(&self, table: &'static str, label_column: &'static str)
        -> Result<Vec<(i64, String)>>;
}

/// SQLx-based admin query repository implementation
pub struct SqlxAdminQueryRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminQueryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminQueryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminQueryRepository for SqlxAdminQueryRepository {
    async fn search_ids(&self, query: &AdminQuery) -> Result<PagedResult<i64>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => search_ids_sqlite(pool, query).await,
            Backend::Mysql(pool) => search_ids_mysql(pool, query).await,
        }
    }

    async fn distinct_years(&self, table: &'static str, column: &'static str) -> Result<Vec<i32>> {
        let years = match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let sql = format!(
                    "SELECT DISTINCT CAST(strftime('%Y', {col}) AS INTEGER) AS y FROM {table} ORDER BY y DESC",
                    col = column,
                    table = table
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list distinct years")?
            }
            Backend::Mysql(pool) => {
                let sql = format!(
                    "SELECT DISTINCT CAST(YEAR({col}) AS SIGNED) AS y FROM {table} ORDER BY y DESC",
                    col = column,
                    table = table
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list distinct years")?
            }
        };

        Ok(years.into_iter().map(|y| y as i32).collect())
    }

    async fn choices(
        &self,
        table: &'static str,
        label_column: &'static str,
    ) -> Result<Vec<(i64, String)>> {
        let sql = format!(
            "SELECT id, {label} AS label FROM {table} ORDER BY {label}",
            label = label_column,
            table = table
        );
        let choices = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list choices")?
                .iter()
                .map(|row| (row.get("id"), row.get("label")))
                .collect(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .fetch_all(pool)
                .await
                .context("Failed to list choices")?
                .iter()
                .map(|row| (row.get("id"), row.get("label")))
                .collect(),
        };
        Ok(choices)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn search_ids_sqlite(pool: &SqlitePool, query: &AdminQuery) -> Result<PagedResult<i64>> {
    let (where_clause, binds) = query.where_clause(Driver::Sqlite);

    let count_sql = query.count_sql(&where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &binds {
        count_query = match value {
            BindValue::Text(s) => count_query.bind(s.as_str()),
            BindValue::Int(i) => count_query.bind(*i),
            BindValue::Bool(b) => count_query.bind(*b),
        };
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count changelist rows")?;

    let ids_sql = query.ids_sql(&where_clause);
    let mut ids_query = sqlx::query_scalar::<_, i64>(&ids_sql);
    for value in &binds {
        ids_query = match value {
            BindValue::Text(s) => ids_query.bind(s.as_str()),
            BindValue::Int(i) => ids_query.bind(*i),
            BindValue::Bool(b) => ids_query.bind(*b),
        };
    }
    let ids = ids_query
        .bind(query.params.limit())
        .bind(query.params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list changelist rows")?;

    Ok(PagedResult::new(ids, total, &query.params))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn search_ids_mysql(pool: &MySqlPool, query: &AdminQuery) -> Result<PagedResult<i64>> {
    let (where_clause, binds) = query.where_clause(Driver::Mysql);

    let count_sql = query.count_sql(&where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for value in &binds {
        count_query = match value {
            BindValue::Text(s) => count_query.bind(s.as_str()),
            BindValue::Int(i) => count_query.bind(*i),
            BindValue::Bool(b) => count_query.bind(*b),
        };
    }
    let total = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count changelist rows")?;

    let ids_sql = query.ids_sql(&where_clause);
    let mut ids_query = sqlx::query_scalar::<_, i64>(&ids_sql);
    for value in &binds {
        ids_query = match value {
            BindValue::Text(s) => ids_query.bind(s.as_str()),
            BindValue::Int(i) => ids_query.bind(*i),
            BindValue::Bool(b) => ids_query.bind(*b),
        };
    }
    let ids = ids_query
        .bind(query.params.limit())
        .bind(query.params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list changelist rows")?;

    Ok(PagedResult::new(ids, total, &query.params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, DatabasePool};

    async fn setup() -> (DynDatabasePool, SqlxAdminQueryRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (pool.clone(), SqlxAdminQueryRepository::new(pool))
    }

    async fn exec(pool: &DynDatabasePool, sql: &str) {
        pool.execute(sql).await.expect("Failed to seed");
    }

    fn newspaper_query(params: ListParams) -> AdminQuery {
        AdminQuery {
            search_fields: &["title", "content"],
            ..AdminQuery::new("newspapers", params)
        }
    }

    async fn seed_newspapers(pool: &DynDatabasePool) {
        exec(pool, "INSERT INTO topics (id, name) VALUES (1, 'Politics'), (2, 'Sport')").await;
        exec(
            pool,
            "INSERT INTO newspapers (id, title, content, published_date) VALUES \
             (1, 'Election night', 'Votes counted', '2022-11-08'), \
             (2, 'Cup final', 'A late goal', '2023-05-20'), \
             (3, 'Budget vote', 'Parliament 100% agreed', '2023-02-01')",
        )
        .await;
        exec(
            pool,
            "INSERT INTO newspaper_topics (newspaper_id, topic_id) VALUES (1, 1), (2, 2), (3, 1)",
        )
        .await;
    }

    #[test]
    fn test_where_clause_empty_without_search_or_filters() {
        let query = AdminQuery::new("topics", ListParams::default());
        let (clause, binds) = query.where_clause(Driver::Sqlite);
        assert!(clause.is_empty());
        assert!(binds.is_empty());
        assert_eq!(query.order_clause(), " ORDER BY id DESC");
    }

    #[test]
    fn test_where_clause_per_driver_year() {
        let mut query = AdminQuery::new("newspapers", ListParams::default());
        query.filters.push(AdminFilter::Year {
            column: "published_date",
            year: 2023,
        });

        let (sqlite, sqlite_binds) = query.where_clause(Driver::Sqlite);
        assert_eq!(sqlite, " WHERE strftime('%Y', published_date) = ?");
        assert_eq!(sqlite_binds, vec![BindValue::Text("2023".into())]);

        let (mysql, mysql_binds) = query.where_clause(Driver::Mysql);
        assert_eq!(mysql, " WHERE YEAR(published_date) = ?");
        assert_eq!(mysql_binds, vec![BindValue::Int(2023)]);
    }

    #[tokio::test]
    async fn test_search_ids_newest_first() {
        let (pool, repo) = setup().await;
        seed_newspapers(&pool).await;

        let page = repo
            .search_ids(&newspaper_query(ListParams::new(1, 100)))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_search_matches_any_field_case_insensitive() {
        let (pool, repo) = setup().await;
        seed_newspapers(&pool).await;

        let mut query = newspaper_query(ListParams::new(1, 100));
        query.search = Some("VOTE".to_string());
        let page = repo.search_ids(&query).await.unwrap();
        assert_eq!(page.items, vec![3, 1]);

        query.search = Some("100%".to_string());
        let page = repo.search_ids(&query).await.unwrap();
        assert_eq!(page.items, vec![3]);
    }

    #[tokio::test]
    async fn test_year_and_related_filters_narrow_results() {
        let (pool, repo) = setup().await;
        seed_newspapers(&pool).await;

        let mut query = newspaper_query(ListParams::new(1, 100));
        query.filters.push(AdminFilter::Year {
            column: "published_date",
            year: 2023,
        });
        assert_eq!(repo.search_ids(&query).await.unwrap().items, vec![3, 2]);

        query.filters.push(AdminFilter::Related {
            join_table: "newspaper_topics",
            owner_column: "newspaper_id",
            join_column: "topic_id",
            value: 1,
        });
        let page = repo.search_ids(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items, vec![3]);
    }

    #[tokio::test]
    async fn test_boolean_filter_and_paging() {
        let (pool, repo) = setup().await;
        exec(
            &pool,
            "INSERT INTO redactors (username, password_hash, is_staff) VALUES \
             ('a', 'h', 1), ('b', 'h', 0), ('c', 'h', 1), ('d', 'h', 1)",
        )
        .await;

        let mut query = AdminQuery::new("redactors", ListParams::new(2, 2));
        query.filters.push(AdminFilter::Boolean {
            column: "is_staff",
            value: true,
        });
        let page = repo.search_ids(&query).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_distinct_years_and_choices() {
        let (pool, repo) = setup().await;
        seed_newspapers(&pool).await;

        let years = repo.distinct_years("newspapers", "published_date").await.unwrap();
        assert_eq!(years, vec![2023, 2022]);

        let choices = repo.choices("topics", "name").await.unwrap();
        assert_eq!(
            choices,
            vec![(1, "Politics".to_string()), (2, "Sport".to_string())]
        );
    }
}
