//! Per-user search history, persisted in SQLite

use crate::Result;
use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;

/// Statements which set up the database schema
const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        email TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS search_history (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        query TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE INDEX IF NOT EXISTS search_history_by_user ON search_history(user_id)",
];

/// What to remove from a user's search history
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Deletion {
    /// Every saved search
    All,

    /// Every occurence of one saved search
    Query(Box<str>),
}

/// Saved searches of all users
#[derive(Clone, Debug)]
pub struct HistoryStore {
    pool: SqlitePool,
}
//
impl HistoryStore {
    /// Open the history database, creating it if needed
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("setting up the database directory")?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("opening search history database {}", path.display()))?;
        Self::with_pool(pool).await
    }

    /// Open a throwaway history database
    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let options = <SqliteConnectOptions as std::str::FromStr>::from_str("sqlite::memory:")
            .context("configuring in-memory database")?
            .foreign_keys(true);
        // Each connection to an in-memory database sees a different database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("opening in-memory search history database")?;
        Self::with_pool(pool).await
    }

    /// Set up the schema on a freshly opened database
    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .context("setting up the search history schema")?;
        }
        Ok(Self { pool })
    }

    /// Save a search on behalf of a user, registering the user if needed
    pub async fn record(&self, email: &str, query: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.context("starting transaction")?;
        sqlx::query("INSERT OR IGNORE INTO users (email) VALUES (?)")
            .bind(email)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("registering user {email}"))?;
        sqlx::query(
            "INSERT INTO search_history (user_id, query)
             SELECT id, ? FROM users WHERE email = ?",
        )
        .bind(query)
        .bind(email)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("saving search {query:?} of user {email}"))?;
        tx.commit().await.context("committing saved search")?;
        log::debug!("Saved search {query:?} of user {email}");
        Ok(())
    }

    /// Distinct saved searches of a user, in order of first use
    ///
    /// Returns `None` if the user is unknown or has no saved search.
    pub async fn list(&self, email: &str) -> Result<Option<Vec<String>>> {
        let Some(user_id) = self.user_id(email).await? else {
            return Ok(None);
        };
        let queries = sqlx::query_scalar::<_, String>(
            "SELECT query FROM search_history
             WHERE user_id = ?
             GROUP BY query
             ORDER BY MIN(id)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("listing saved searches of user {email}"))?;
        Ok((!queries.is_empty()).then_some(queries))
    }

    /// Remove saved searches of a user
    ///
    /// Returns truth that something was removed. Fails if the user is unknown.
    pub async fn delete(&self, email: &str, deletion: &Deletion) -> Result<bool> {
        let user_id = self
            .user_id(email)
            .await?
            .with_context(|| format!("failed to find user with email {email}"))?;
        let result = match deletion {
            Deletion::All => {
                sqlx::query("DELETE FROM search_history WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
            Deletion::Query(query) => {
                sqlx::query("DELETE FROM search_history WHERE user_id = ? AND query = ?")
                    .bind(user_id)
                    .bind(&**query)
                    .execute(&self.pool)
                    .await
            }
        }
        .with_context(|| format!("deleting saved searches of user {email}"))?;
        log::info!(
            "Deleted {} saved searches of user {email}",
            result.rows_affected()
        );
        Ok(result.rows_affected() > 0)
    }

    /// Close the database
    pub async fn close(self) {
        self.pool.close().await
    }

    /// Identifier of a known user
    async fn user_id(&self, email: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("looking up user {email}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "alice@example.org";

    #[tokio::test]
    async fn unknown_user() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        assert_eq!(store.list(ALICE).await.unwrap(), None);
        assert!(store.delete(ALICE, &Deletion::All).await.is_err());
    }

    #[tokio::test]
    async fn lists_distinct_searches_in_order() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        store.record(ALICE, "diet=herbivorous").await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        store.record("bob@example.org", "foundIn=USA").await.unwrap();
        assert_eq!(
            store.list(ALICE).await.unwrap().unwrap(),
            ["name=Tyr", "diet=herbivorous"]
        );
    }

    #[tokio::test]
    async fn deletes_one_search() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        store.record(ALICE, "decade=1900s").await.unwrap();

        let deletion = Deletion::Query("name=Tyr".into());
        assert!(store.delete(ALICE, &deletion).await.unwrap());
        assert!(!store.delete(ALICE, &deletion).await.unwrap());
        assert_eq!(store.list(ALICE).await.unwrap().unwrap(), ["decade=1900s"]);
    }

    #[tokio::test]
    async fn deletes_everything() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        assert!(store.delete(ALICE, &Deletion::All).await.unwrap());
        assert_eq!(store.list(ALICE).await.unwrap(), None);
        assert!(!store.delete(ALICE, &Deletion::All).await.unwrap());
    }

    #[tokio::test]
    async fn persists_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("history.sqlite");
        let store = HistoryStore::open(&path).await.unwrap();
        store.record(ALICE, "name=Tyr").await.unwrap();
        store.close().await;

        let store = HistoryStore::open(&path).await.unwrap();
        assert_eq!(store.list(ALICE).await.unwrap().unwrap(), ["name=Tyr"]);
    }
}
