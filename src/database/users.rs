// ABOUTME: User account database operations
// ABOUTME: Handles account storage and lookup by id or email
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_millis, is_unique_violation, parse_uuid, to_millis, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use uuid::Uuid;

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('patient', 'staff')),
                created_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a user account
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database
    /// error if the insert fails
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        insert_user(&self.pool, user).await?;
        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        self.get_user_impl("id", &user_id.to_string()).await
    }

    /// Get a user by email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.get_user_impl("email", email).await
    }

    async fn get_user_impl(&self, field: &str, value: &str) -> AppResult<Option<User>> {
        let query = format!(
            r"
            SELECT id, email, password_hash, role, created_at
            FROM users WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

/// Insert a user on any executor, so registration can share a transaction
pub(super) async fn insert_user<'e, E>(executor: E, user: &User) -> AppResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r"
        INSERT INTO users (id, email, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(to_millis(user.created_at))
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::already_exists(format!("Email {} is already registered", user.email))
        } else {
            AppError::database(format!("Failed to create user: {e}"))
        }
    })?;
    Ok(())
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    Ok(User {
        id: parse_uuid(&id, "users.id")?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role
            .parse::<UserRole>()
            .map_err(AppError::database)?,
        created_at: from_millis(row.get("created_at"), "users.created_at")?,
    })
}
