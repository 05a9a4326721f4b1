// ABOUTME: Patient profile model with demographic fields
// ABOUTME: Includes creation input and partial update types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Patient profile, owned by a patient user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique patient ID
    pub id: Uuid,
    /// Owning user account
    pub user_id: Uuid,
    /// Full legal name
    pub full_name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Postal address
    pub address: Option<String>,
    /// Phone number
    pub contact_number: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last profile change
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a patient profile
#[derive(Debug, Clone)]
pub struct NewPatient {
    /// Owning user account
    pub user_id: Uuid,
    /// Full legal name
    pub full_name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Postal address
    pub address: Option<String>,
    /// Phone number
    pub contact_number: Option<String>,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    /// New full name
    pub full_name: Option<String>,
    /// New date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// New address
    pub address: Option<String>,
    /// New contact number
    pub contact_number: Option<String>,
}

impl PatientUpdate {
    /// Whether the update changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.date_of_birth.is_none()
            && self.address.is_none()
            && self.contact_number.is_none()
    }

    /// Apply the update to a profile in place
    pub fn apply_to(self, patient: &mut Patient) {
        if let Some(full_name) = self.full_name {
            patient.full_name = full_name;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            patient.date_of_birth = date_of_birth;
        }
        if let Some(address) = self.address {
            patient.address = Some(address);
        }
        if let Some(contact_number) = self.contact_number {
            patient.contact_number = Some(contact_number);
        }
    }
}
