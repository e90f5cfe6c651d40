//! Database layer
//!
//! SQLite is the default backend (single file, zero setup); MySQL is available
//! for shared deployments. The backend is selected by configuration and hidden
//! behind the `DatabasePool` trait.
//!
//! ```ignore
//! use pulse::config::DatabaseConfig;
//! use pulse::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};

/// Check whether an error was caused by a unique constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

/// Escape a user-supplied fragment for use inside `LIKE ... ESCAPE '!'`
pub fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '!') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("news"), "%news%");
        assert_eq!(like_pattern("100%"), "%100!%%");
        assert_eq!(like_pattern("a_b!"), "%a!_b!!%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[tokio::test]
    async fn test_is_unique_violation_detects_constraint() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let sqlite = pool.as_sqlite().unwrap();

        sqlx::query("INSERT INTO topics (name) VALUES ('Economy')")
            .execute(sqlite)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO topics (name) VALUES ('Economy')")
            .execute(sqlite)
            .await
            .map_err(|e| anyhow::Error::new(e).context("Failed to create topic"))
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&anyhow::anyhow!("something else")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every escaped pattern matches the fragment it was built from, as a substring
        #[test]
        fn prop_like_pattern_matches_own_fragment(
            prefix in "[a-z ]{0,5}",
            fragment in "[a-zA-Z0-9%_! ]{1,12}",
            suffix in "[a-z ]{0,5}",
        ) {
            let title = format!("{}{}{}", prefix, fragment, suffix);
            let matched = tokio_test::block_on(async {
                let pool = create_test_pool().await.unwrap();
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) WHERE LOWER(?) LIKE LOWER(?) ESCAPE '!'",
                )
                .bind(&title)
                .bind(like_pattern(&fragment))
                .fetch_one(pool.as_sqlite().unwrap())
                .await
                .unwrap()
            });
            prop_assert_eq!(matched, 1);
        }
    }
}
