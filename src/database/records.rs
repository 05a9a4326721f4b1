// ABOUTME: Medical record database operations
// ABOUTME: Stores staff-authored records and tracks the last editing staff member
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{from_millis, parse_optional_uuid, parse_uuid, to_millis, Database};
use crate::errors::{AppError, AppResult};
use crate::models::Record;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const RECORD_COLUMNS: &str =
    "id, patient_id, author_staff_id, content, created_at, updated_at, updated_by_staff_id";

impl Database {
    /// Create the records table
    pub(super) async fn migrate_records(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
                author_staff_id TEXT NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                updated_by_staff_id TEXT REFERENCES users(id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_records_patient ON records(patient_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_record(&self, record: &Record) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO records (
                id, patient_id, author_staff_id, content, created_at, updated_at,
                updated_by_staff_id
            ) VALUES ($1, $2, $3, $4, $5, NULL, NULL)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.patient_id.to_string())
        .bind(record.author_staff_id.to_string())
        .bind(&record.content)
        .bind(to_millis(record.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create record: {e}")))?;
        Ok(())
    }

    /// Get a record by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_record(&self, record_id: Uuid) -> AppResult<Option<Record>> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = $1"))
            .bind(record_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get record: {e}")))?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// List a patient's records, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_records(&self, patient_id: Uuid) -> AppResult<Vec<Record>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE patient_id = $1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(patient_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list records: {e}")))?;

        rows.iter().map(row_to_record).collect()
    }

    /// Replace a record's content, keeping its original author
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn update_record_content(
        &self,
        record_id: Uuid,
        content: &str,
        staff_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Record>> {
        let result = sqlx::query(
            r"
            UPDATE records
            SET content = $2, updated_at = $3, updated_by_staff_id = $4
            WHERE id = $1
            ",
        )
        .bind(record_id.to_string())
        .bind(content)
        .bind(to_millis(now))
        .bind(staff_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update record: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_record(record_id).await
    }
}

fn row_to_record(row: &SqliteRow) -> AppResult<Record> {
    let id: String = row.get("id");
    let patient_id: String = row.get("patient_id");
    let author: String = row.get("author_staff_id");
    let updated_by: Option<String> = row.get("updated_by_staff_id");
    let updated_at: Option<i64> = row.get("updated_at");
    Ok(Record {
        id: parse_uuid(&id, "records.id")?,
        patient_id: parse_uuid(&patient_id, "records.patient_id")?,
        author_staff_id: parse_uuid(&author, "records.author_staff_id")?,
        content: row.get("content"),
        created_at: from_millis(row.get("created_at"), "records.created_at")?,
        updated_at: updated_at
            .map(|ms| from_millis(ms, "records.updated_at"))
            .transpose()?,
        updated_by_staff_id: parse_optional_uuid(
            updated_by.as_deref(),
            "records.updated_by_staff_id",
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPatient, User, UserRole};
    use chrono::{Duration, NaiveDate};

    fn user(role: UserRole, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@clinic.org", Uuid::new_v4().simple()),
            password_hash: "hash".to_owned(),
            role,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_records_listed_newest_first_and_edit_keeps_author() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();

        let author = user(UserRole::Staff, now);
        let editor = user(UserRole::Staff, now);
        db.create_user(&author).await.unwrap();
        db.create_user(&editor).await.unwrap();
        let owner = user(UserRole::Patient, now);
        let patient = db
            .create_patient_account(
                &owner,
                NewPatient {
                    user_id: owner.id,
                    full_name: "Mary Seacole".to_owned(),
                    date_of_birth: NaiveDate::from_ymd_opt(1975, 11, 23).unwrap(),
                    address: None,
                    contact_number: None,
                },
                now,
            )
            .await
            .unwrap();

        let older = Record {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            author_staff_id: author.id,
            content: "Admitted".to_owned(),
            created_at: now,
            updated_at: None,
            updated_by_staff_id: None,
        };
        let newer = Record {
            id: Uuid::new_v4(),
            content: "Discharged".to_owned(),
            created_at: now + Duration::hours(2),
            ..older.clone()
        };
        db.create_record(&older).await.unwrap();
        db.create_record(&newer).await.unwrap();

        let listed = db.list_records(patient.id).await.unwrap();
        assert_eq!(listed, vec![newer.clone(), older.clone()]);

        let edited_at = now + Duration::hours(3);
        let edited = db
            .update_record_content(older.id, "Admitted overnight", editor.id, edited_at)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.author_staff_id, author.id);
        assert_eq!(edited.updated_by_staff_id, Some(editor.id));
        assert_eq!(edited.updated_at, Some(edited_at));

        assert!(db
            .update_record_content(Uuid::new_v4(), "x", editor.id, edited_at)
            .await
            .unwrap()
            .is_none());
    }
}
