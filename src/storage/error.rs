// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Data access errors.

/// Result type alias for data access operations.
pub type StorageResult<T> = Result<T, DataAccessError>;

/// Errors surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    /// A lookup that must succeed found no row
    #[error("{} not found", .model.as_deref().unwrap_or("record"))]
    NotFound {
        /// Model the lookup targeted (e.g. `User`)
        model: Option<String>,
        /// Driver-level description, if any
        cause: Option<String>,
    },

    /// Query or constraint failure
    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Embedded migrations could not be applied
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DataAccessError {
    pub fn not_found(model: impl Into<String>) -> Self {
        DataAccessError::NotFound {
            model: Some(model.into()),
            cause: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataAccessError::NotFound { .. })
    }
}

impl From<sqlx::Error> for DataAccessError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataAccessError::NotFound {
                model: None,
                cause: Some(err.to_string()),
            },
            other => DataAccessError::Query(other),
        }
    }
}
