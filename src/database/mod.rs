// ABOUTME: SQLite database manager for portal storage and migrations
// ABOUTME: Opens the sqlx pool and runs table, index, and trigger migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! `SQLite` storage for the medical records portal: user accounts, patient
//! profiles, medical records, QR access tokens, the append-only audit trail,
//! and persisted system secrets.
//!
//! Timestamps are stored as UTC epoch milliseconds so expiry checks can be
//! evaluated inside a single conditional `UPDATE`.

mod audit;
mod patients;
mod qr_tokens;
mod records;
mod system_secrets;
mod users;

use crate::constants::defaults;
use crate::errors::{AppError, AppResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Database manager for all portal storage
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database and run migrations
    ///
    /// In-memory databases are held on a single persistent connection, since
    /// every `SQLite` memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let is_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(defaults::DATABASE_BUSY_TIMEOUT_SECS));
        if !is_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.migrate().await?;

        info!(memory = is_memory, "Database initialized");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table, index, or trigger cannot be created
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_patients().await?;
        self.migrate_records().await?;
        self.migrate_qr_tokens().await?;
        self.migrate_audit().await?;
        self.migrate_system_secrets().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    /// Check the database answers a trivial query
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::unavailable(format!("Database unavailable: {e}")))?;
        Ok(())
    }
}

/// Parse a UUID stored as TEXT
pub(crate) fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Invalid UUID in column {column}: {e}")))
}

/// Parse an optional UUID stored as TEXT
pub(crate) fn parse_optional_uuid(value: Option<&str>, column: &str) -> AppResult<Option<Uuid>> {
    value.map(|v| parse_uuid(v, column)).transpose()
}

/// Stored representation of a timestamp
pub(crate) const fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Decode a stored timestamp
pub(crate) fn from_millis(millis: i64, column: &str) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::database(format!("Timestamp out of range in column {column}")))
}

/// Whether a query failed on a UNIQUE constraint
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}
