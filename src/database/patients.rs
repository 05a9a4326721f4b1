// ABOUTME: Patient profile database operations
// ABOUTME: Registers patient accounts with their profile and applies profile edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::users::insert_user;
use super::{from_millis, parse_uuid, to_millis, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{NewPatient, Patient, User};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the patients table
    pub(super) async fn migrate_patients(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                user_id TEXT UNIQUE NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                full_name TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                address TEXT,
                contact_number TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create a patient user and its profile in one transaction
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database
    /// error if either insert fails
    pub async fn create_patient_account(
        &self,
        user: &User,
        profile: NewPatient,
        now: DateTime<Utc>,
    ) -> AppResult<Patient> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        insert_user(&mut *tx, user).await?;

        let patient = Patient {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            full_name: profile.full_name,
            date_of_birth: profile.date_of_birth,
            address: profile.address,
            contact_number: profile.contact_number,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO patients (
                id, user_id, full_name, date_of_birth, address, contact_number,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(patient.id.to_string())
        .bind(patient.user_id.to_string())
        .bind(&patient.full_name)
        .bind(patient.date_of_birth)
        .bind(&patient.address)
        .bind(&patient.contact_number)
        .bind(to_millis(patient.created_at))
        .bind(to_millis(patient.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create patient: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit registration: {e}")))?;

        Ok(patient)
    }

    /// Get a patient by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_patient(&self, patient_id: Uuid) -> AppResult<Option<Patient>> {
        self.get_patient_impl("id", patient_id).await
    }

    /// Get the patient profile owned by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_patient_by_user(&self, user_id: Uuid) -> AppResult<Option<Patient>> {
        self.get_patient_impl("user_id", user_id).await
    }

    async fn get_patient_impl(&self, field: &str, value: Uuid) -> AppResult<Option<Patient>> {
        let query = format!(
            r"
            SELECT id, user_id, full_name, date_of_birth, address, contact_number,
                   created_at, updated_at
            FROM patients WHERE {field} = $1
            "
        );

        let row = sqlx::query(&query)
            .bind(value.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get patient: {e}")))?;

        row.as_ref().map(row_to_patient).transpose()
    }

    /// Persist an edited patient profile
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the patient does not exist, or a
    /// database error if the update fails
    pub async fn update_patient(&self, patient: &Patient) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE patients
            SET full_name = $2, date_of_birth = $3, address = $4, contact_number = $5,
                updated_at = $6
            WHERE id = $1
            ",
        )
        .bind(patient.id.to_string())
        .bind(&patient.full_name)
        .bind(patient.date_of_birth)
        .bind(&patient.address)
        .bind(&patient.contact_number)
        .bind(to_millis(patient.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update patient: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Patient"));
        }
        Ok(())
    }
}

fn row_to_patient(row: &SqliteRow) -> AppResult<Patient> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let date_of_birth: NaiveDate = row
        .try_get("date_of_birth")
        .map_err(|e| AppError::database(format!("Invalid date_of_birth: {e}")))?;
    Ok(Patient {
        id: parse_uuid(&id, "patients.id")?,
        user_id: parse_uuid(&user_id, "patients.user_id")?,
        full_name: row.get("full_name"),
        date_of_birth,
        address: row.get("address"),
        contact_number: row.get("contact_number"),
        created_at: from_millis(row.get("created_at"), "patients.created_at")?,
        updated_at: from_millis(row.get("updated_at"), "patients.updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{PatientUpdate, UserRole};

    fn patient_user(email: &str, now: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: "hash".to_owned(),
            role: UserRole::Patient,
            created_at: now,
        }
    }

    fn profile(user_id: Uuid) -> NewPatient {
        NewPatient {
            user_id,
            full_name: "Ada Lovelace".to_owned(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 10).unwrap(),
            address: None,
            contact_number: Some("555-0100".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_register_and_update_patient() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let user = patient_user("ada@example.com", now);

        let patient = db
            .create_patient_account(&user, profile(user.id), now)
            .await
            .unwrap();
        assert_eq!(db.get_patient(patient.id).await.unwrap(), Some(patient.clone()));
        assert_eq!(
            db.get_patient_by_user(user.id).await.unwrap().map(|p| p.id),
            Some(patient.id)
        );

        let mut edited = patient.clone();
        PatientUpdate {
            address: Some("12 St James's Square".to_owned()),
            ..PatientUpdate::default()
        }
        .apply_to(&mut edited);
        edited.updated_at = now + chrono::Duration::minutes(1);
        db.update_patient(&edited).await.unwrap();

        let stored = db.get_patient(patient.id).await.unwrap().unwrap();
        assert_eq!(stored.address.as_deref(), Some("12 St James's Square"));
        assert_eq!(stored.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_failed_registration_leaves_no_user() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = Utc::now();
        let first = patient_user("taken@example.com", now);
        db.create_patient_account(&first, profile(first.id), now)
            .await
            .unwrap();

        let second = patient_user("taken@example.com", now);
        let err = db
            .create_patient_account(&second, profile(second.id), now)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
        assert_eq!(db.get_user(second.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_unknown_patient_is_not_found() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let now = Utc::now();
        let ghost = Patient {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Nobody".to_owned(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            address: None,
            contact_number: None,
            created_at: now,
            updated_at: now,
        };
        let err = db.update_patient(&ghost).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
    }
}
