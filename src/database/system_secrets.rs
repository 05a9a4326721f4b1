// ABOUTME: Persisted server secrets such as the QR payload signing key
// ABOUTME: Generates a random value on first use so restarts keep issued payloads valid
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{to_millis, Database};
use crate::errors::{AppError, AppResult};
use anyhow::Result;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::Row;

/// Length in bytes of generated secrets
const GENERATED_SECRET_BYTES: usize = 32;

impl Database {
    /// Create the `system_secrets` table
    pub(super) async fn migrate_system_secrets(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS system_secrets (
                secret_type TEXT PRIMARY KEY,
                secret_value TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a hex-encoded secret, generating and storing it if absent
    ///
    /// Concurrent first calls converge on whichever value was stored first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_or_create_system_secret(&self, secret_type: &str) -> AppResult<String> {
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);

        sqlx::query(
            r"
            INSERT OR IGNORE INTO system_secrets (secret_type, secret_value, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(secret_type)
        .bind(hex::encode(bytes))
        .bind(to_millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store system secret: {e}")))?;

        let row = sqlx::query("SELECT secret_value FROM system_secrets WHERE secret_type = $1")
            .bind(secret_type)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load system secret: {e}")))?;

        Ok(row.get("secret_value"))
    }
}
