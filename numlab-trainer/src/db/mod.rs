//! SQLite persistence
//!
//! Scores live in a `settings` key-value table, created on first run.

pub mod init;
pub mod settings;

pub use init::init_database;

use crate::error::Result;
use crate::storage::ScoreStore;
use sqlx::SqlitePool;
use std::path::Path;

/// `ScoreStore` backed by the settings table
#[derive(Debug, Clone)]
pub struct SqliteScoreStore {
    pool: SqlitePool,
}

impl SqliteScoreStore {
    /// Open (or create) the database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_pool(init_database(path).await?))
    }

    /// Wrap a pool whose settings table already exists
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl ScoreStore for SqliteScoreStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        settings::get_setting::<String>(&self.pool, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        settings::set_setting(&self.pool, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        settings::delete_setting(&self.pool, key).await
    }
}
