// ABOUTME: QR access token database operations
// ABOUTME: Issuance with revocation of older tokens and compare-and-set consumption
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_millis, is_unique_violation, parse_uuid, to_millis, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{AccessToken, TokenState};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

impl Database {
    /// Create the `qr_tokens` table
    ///
    /// The partial unique index allows at most one pending token per patient.
    pub(super) async fn migrate_qr_tokens(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS qr_tokens (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
                secret_hash TEXT NOT NULL,
                issued_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                state TEXT NOT NULL DEFAULT 'pending'
                    CHECK (state IN ('pending', 'consumed', 'expired', 'revoked')),
                consumed_at INTEGER,
                revoked_at INTEGER
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_qr_tokens_one_pending
            ON qr_tokens(patient_id) WHERE state = 'pending'
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a freshly issued token, revoking the patient's pending one
    ///
    /// The revoke runs first so the transaction takes the write lock before
    /// it reads anything.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the patient does not exist,
    /// `ResourceAlreadyExists` if a concurrent issuance won the race, or a
    /// database error
    pub async fn issue_qr_token(&self, token: &AccessToken) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let revoked = sqlx::query(
            r"
            UPDATE qr_tokens SET state = 'revoked', revoked_at = $2
            WHERE patient_id = $1 AND state = 'pending'
            ",
        )
        .bind(token.patient_id.to_string())
        .bind(to_millis(token.issued_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to revoke QR tokens: {e}")))?
        .rows_affected();

        let patient_exists = sqlx::query("SELECT 1 FROM patients WHERE id = $1")
            .bind(token.patient_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up patient: {e}")))?
            .is_some();
        if !patient_exists {
            return Err(AppError::not_found("Patient"));
        }

        sqlx::query(
            r"
            INSERT INTO qr_tokens (id, patient_id, secret_hash, issued_at, expires_at, state)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            ",
        )
        .bind(token.id.to_string())
        .bind(token.patient_id.to_string())
        .bind(&token.secret_hash)
        .bind(to_millis(token.issued_at))
        .bind(to_millis(token.expires_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("A QR access token is already being issued")
            } else {
                AppError::database(format!("Failed to store QR token: {e}"))
            }
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit QR token: {e}")))?;

        debug!(token.id = %token.id, revoked, "Stored QR access token");
        Ok(())
    }

    /// Get a token by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_qr_token(&self, token_id: Uuid) -> AppResult<Option<AccessToken>> {
        let row = sqlx::query(
            r"
            SELECT id, patient_id, secret_hash, issued_at, expires_at, state, consumed_at
            FROM qr_tokens WHERE id = $1
            ",
        )
        .bind(token_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get QR token: {e}")))?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Get the patient's pending token, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_pending_qr_token(&self, patient_id: Uuid) -> AppResult<Option<AccessToken>> {
        let row = sqlx::query(
            r"
            SELECT id, patient_id, secret_hash, issued_at, expires_at, state, consumed_at
            FROM qr_tokens WHERE patient_id = $1 AND state = 'pending'
            ",
        )
        .bind(patient_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get pending QR token: {e}")))?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Atomically move a pending, unexpired token to consumed
    ///
    /// Returns `true` only for the single caller whose update applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn consume_qr_token(&self, token_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE qr_tokens SET state = 'consumed', consumed_at = $1
            WHERE id = $2 AND state = 'pending' AND expires_at >= $1
            ",
        )
        .bind(to_millis(now))
        .bind(token_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to consume QR token: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Move a pending token to expired
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn expire_qr_token(&self, token_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE qr_tokens SET state = 'expired' WHERE id = $1 AND state = 'pending'",
        )
        .bind(token_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to expire QR token: {e}")))?;

        Ok(result.rows_affected() == 1)
    }
}

fn row_to_token(row: &SqliteRow) -> AppResult<AccessToken> {
    let id: String = row.get("id");
    let patient_id: String = row.get("patient_id");
    let state: String = row.get("state");
    let consumed_at: Option<i64> = row.get("consumed_at");
    Ok(AccessToken {
        id: parse_uuid(&id, "qr_tokens.id")?,
        patient_id: parse_uuid(&patient_id, "qr_tokens.patient_id")?,
        secret_hash: row.get("secret_hash"),
        issued_at: from_millis(row.get("issued_at"), "qr_tokens.issued_at")?,
        expires_at: from_millis(row.get("expires_at"), "qr_tokens.expires_at")?,
        state: state.parse::<TokenState>().map_err(AppError::database)?,
        consumed_at: consumed_at
            .map(|ms| from_millis(ms, "qr_tokens.consumed_at"))
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{NewPatient, User, UserRole};
    use chrono::{Duration, NaiveDate};

    async fn patient(db: &Database, now: DateTime<Utc>) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            password_hash: "hash".to_owned(),
            role: UserRole::Patient,
            created_at: now,
        };
        let profile = NewPatient {
            user_id: user.id,
            full_name: "Grace Hopper".to_owned(),
            date_of_birth: NaiveDate::from_ymd_opt(1966, 12, 9).unwrap(),
            address: None,
            contact_number: None,
        };
        db.create_patient_account(&user, profile, now).await.unwrap().id
    }

    fn token(patient_id: Uuid, now: DateTime<Utc>) -> AccessToken {
        AccessToken {
            id: Uuid::new_v4(),
            patient_id,
            secret_hash: "abc123".to_owned(),
            issued_at: now,
            expires_at: now + Duration::minutes(5),
            state: TokenState::Pending,
            consumed_at: None,
        }
    }

    #[tokio::test]
    async fn test_consume_applies_once() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let first = token(patient(&db, now).await, now);
        db.issue_qr_token(&first).await.unwrap();

        assert!(db.consume_qr_token(first.id, now).await.unwrap());
        assert!(!db.consume_qr_token(first.id, now).await.unwrap());

        let stored = db.get_qr_token(first.id).await.unwrap().unwrap();
        assert_eq!(stored.state, TokenState::Consumed);
        assert_eq!(stored.consumed_at, Some(now));
    }

    #[tokio::test]
    async fn test_consume_refuses_expired_row() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let issued = token(patient(&db, now).await, now);
        db.issue_qr_token(&issued).await.unwrap();

        let late = issued.expires_at + Duration::milliseconds(1);
        assert!(!db.consume_qr_token(issued.id, late).await.unwrap());
        assert!(db.expire_qr_token(issued.id).await.unwrap());
        assert!(!db.expire_qr_token(issued.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_revokes_pending_token() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let patient_id = patient(&db, now).await;

        let first = token(patient_id, now);
        db.issue_qr_token(&first).await.unwrap();
        let second = token(patient_id, now + Duration::seconds(10));
        db.issue_qr_token(&second).await.unwrap();

        let revoked = db.get_qr_token(first.id).await.unwrap().unwrap();
        assert_eq!(revoked.state, TokenState::Revoked);
        assert_eq!(
            db.get_pending_qr_token(patient_id).await.unwrap().map(|t| t.id),
            Some(second.id)
        );
    }

    #[tokio::test]
    async fn test_issue_for_unknown_patient() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = Utc::now();
        let err = db
            .issue_qr_token(&token(Uuid::new_v4(), now))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }
}
