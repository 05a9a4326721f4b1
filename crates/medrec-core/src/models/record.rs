// ABOUTME: Medical record model, always attributed to a staff author
// ABOUTME: Edits record the editing staff member without replacing the original author
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medical record entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique record ID
    pub id: Uuid,
    /// Patient the record belongs to
    pub patient_id: Uuid,
    /// Staff member who created the record
    pub author_staff_id: Uuid,
    /// Record body
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Time of the last staff edit
    pub updated_at: Option<DateTime<Utc>>,
    /// Staff member who made the last edit
    pub updated_by_staff_id: Option<Uuid>,
}
