// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! SQLite persistence through a `sqlx` connection pool. The schema lives in
//! `migrations/` and is embedded into the binary; it is applied on every
//! connect, so a fresh file or in-memory database is always usable.
//!
//! ## Tables
//!
//! | Table | Key | Purpose |
//! |-------|-----|---------|
//! | `users` | `id` (UUID v4) | Accounts; `email` and `username` are unique |
//! | `follows` | `(follower_id, followee_id)` | Directed follow edges |

pub mod error;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info, instrument};

pub use error::{DataAccessError, StorageResult};
pub use users::{NewUser, UniqueField, User, UserChanges, UserRepository};

/// Shared handle to the database pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url` and apply migrations.
    #[instrument(skip_all)]
    pub async fn connect(url: &str) -> StorageResult<Self> {
        info!("opening SQLite database");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    /// Private in-memory database, used by tests.
    ///
    /// Limited to a single connection: every new in-memory connection would
    /// otherwise see its own empty database.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> StorageResult<Self> {
        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations complete");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap round trip used by the readiness probe.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }
}
