// ABOUTME: Append-only audit trail database operations
// ABOUTME: Triggers reject UPDATE and DELETE so stored entries can never change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_millis, parse_optional_uuid, parse_uuid, to_millis, Database};
use crate::audit::AuditSink;
use crate::errors::{AppError, AppResult, AuditError};
use crate::models::{AuditAction, AuditEntry, AuditOutcome, NewAuditEntry};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const AUDIT_COLUMNS: &str = "id, actor_id, patient_id, action, outcome, detail, created_at";

impl Database {
    /// Create the `audit_logs` table and its immutability triggers
    ///
    /// No foreign keys: entries must outlive the rows they mention and must
    /// be writable for ids that never resolved.
    pub(super) async fn migrate_audit(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                actor_id TEXT,
                patient_id TEXT,
                action TEXT NOT NULL,
                outcome TEXT NOT NULL,
                detail TEXT,
                created_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_patient ON audit_logs(patient_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TRIGGER IF NOT EXISTS audit_logs_no_update
            BEFORE UPDATE ON audit_logs
            BEGIN
                SELECT RAISE(ABORT, 'audit_logs is append-only');
            END
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TRIGGER IF NOT EXISTS audit_logs_no_delete
            BEFORE DELETE ON audit_logs
            BEGIN
                SELECT RAISE(ABORT, 'audit_logs is append-only');
            END
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append an entry to the audit trail
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn append_audit_entry(&self, entry: &NewAuditEntry) -> AppResult<AuditEntry> {
        let stored = AuditEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            patient_id: entry.patient_id,
            action: entry.action,
            outcome: entry.outcome,
            detail: entry.detail.clone(),
            timestamp: entry.occurred_at,
        };

        sqlx::query(
            r"
            INSERT INTO audit_logs (id, actor_id, patient_id, action, outcome, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(stored.id.to_string())
        .bind(stored.actor_id.map(|id| id.to_string()))
        .bind(stored.patient_id.map(|id| id.to_string()))
        .bind(stored.action.as_str())
        .bind(stored.outcome.as_str())
        .bind(&stored.detail)
        .bind(to_millis(stored.timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to append audit entry: {e}")))?;

        Ok(stored)
    }

    /// List audit entries that concern a patient, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_audit_entries(
        &self,
        patient_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {AUDIT_COLUMNS} FROM audit_logs
            WHERE patient_id = $1
            ORDER BY created_at, rowid
            LIMIT $2
            "
        ))
        .bind(patient_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list audit entries: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// List every audit entry for an action, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_audit_entries_by_action(
        &self,
        action: AuditAction,
    ) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE action = $1 ORDER BY created_at, rowid"
        ))
        .bind(action.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list audit entries: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }
}

#[async_trait]
impl AuditSink for Database {
    async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry, AuditError> {
        self.append_audit_entry(entry).await.map_err(AuditError::from)
    }
}

fn row_to_entry(row: &SqliteRow) -> AppResult<AuditEntry> {
    let id: String = row.get("id");
    let actor_id: Option<String> = row.get("actor_id");
    let patient_id: Option<String> = row.get("patient_id");
    let action: String = row.get("action");
    let outcome: String = row.get("outcome");
    Ok(AuditEntry {
        id: parse_uuid(&id, "audit_logs.id")?,
        actor_id: parse_optional_uuid(actor_id.as_deref(), "audit_logs.actor_id")?,
        patient_id: parse_optional_uuid(patient_id.as_deref(), "audit_logs.patient_id")?,
        action: action.parse::<AuditAction>().map_err(AppError::database)?,
        outcome: outcome
            .parse::<AuditOutcome>()
            .map_err(AppError::database)?,
        detail: row.get("detail"),
        timestamp: from_millis(row.get("created_at"), "audit_logs.created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn scan_entry(patient_id: Option<Uuid>, outcome: AuditOutcome) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: Some(Uuid::new_v4()),
            patient_id,
            action: AuditAction::QrScan,
            outcome,
            detail: None,
            occurred_at: DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_by_patient() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let patient_id = Uuid::new_v4();

        let first = db
            .append_audit_entry(&scan_entry(Some(patient_id), AuditOutcome::Success))
            .await
            .unwrap();
        let second = db
            .append_audit_entry(&scan_entry(Some(patient_id), AuditOutcome::AlreadyConsumed))
            .await
            .unwrap();
        db.append_audit_entry(&scan_entry(None, AuditOutcome::MalformedPayload))
            .await
            .unwrap();

        let entries = db.list_audit_entries(patient_id, 10).await.unwrap();
        assert_eq!(entries, vec![first, second]);

        let scans = db
            .list_audit_entries_by_action(AuditAction::QrScan)
            .await
            .unwrap();
        assert_eq!(scans.len(), 3);
    }

    #[tokio::test]
    async fn test_entries_cannot_be_changed() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let entry = db
            .append_audit_entry(&scan_entry(Some(Uuid::new_v4()), AuditOutcome::Success))
            .await
            .unwrap();

        let update = sqlx::query("UPDATE audit_logs SET outcome = 'expired' WHERE id = $1")
            .bind(entry.id.to_string())
            .execute(db.pool())
            .await;
        assert!(update.unwrap_err().to_string().contains("append-only"));

        let delete = sqlx::query("DELETE FROM audit_logs")
            .execute(db.pool())
            .await;
        assert!(delete.is_err());

        let remaining = db
            .list_audit_entries_by_action(AuditAction::QrScan)
            .await
            .unwrap();
        assert_eq!(remaining, vec![entry]);
    }
}
