// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

//! Error types returned by the PostgreSQL backend.

/// Generic error when interacting with the database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// An error which came from the database driver
    #[error(transparent)]
    Driver {
        /// The underlying error from the database driver
        #[from]
        source: sqlx::Error,
    },

    /// An error which happened while running the migrations
    #[error("failed to run migrations")]
    Migration {
        /// The underlying error from the migrator
        #[from]
        source: sqlx::migrate::MigrateError,
    },

    /// An operation affected an unexpected number of rows
    #[error("operation expected to affect {expected} rows but affected {actual}")]
    RowsAffected {
        /// How many rows the operation should have affected
        expected: u64,
        /// How many rows the operation actually affected
        actual: u64,
    },

    /// The data in the database is inconsistent with the schema invariants
    #[error("database inconsistency on table {table}")]
    Inconsistency {
        /// The table on which the inconsistency was observed
        table: &'static str,
    },

    /// An invalid operation, e.g. an out-of-range conversion
    #[error("invalid database operation")]
    InvalidOperation {
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl DatabaseError {
    /// Ensure that an operation affected the expected number of rows,
    /// returning a [`DatabaseError::RowsAffected`] otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the number of rows affected by the operation is
    /// not the expected one
    pub fn ensure_affected_rows(
        result: &sqlx::postgres::PgQueryResult,
        expected: u64,
    ) -> Result<(), Self> {
        let actual = result.rows_affected();
        if actual == expected {
            Ok(())
        } else {
            Err(Self::RowsAffected { expected, actual })
        }
    }

    /// Flag an inconsistency observed on the given table
    #[must_use]
    pub fn inconsistency(table: &'static str) -> Self {
        Self::Inconsistency { table }
    }

    /// Wrap any error as an invalid database operation
    pub fn to_invalid_operation<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidOperation {
            source: Box::new(source),
        }
    }
}
