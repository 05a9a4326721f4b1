// ABOUTME: Append-only audit trail entry model for compliance traceability
// ABOUTME: Defines audited actions and verification outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::QrTokenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A QR access token was issued
    QrIssue,
    /// A QR payload was scanned
    QrScan,
    /// A patient profile was read
    PatientView,
    /// A patient profile was changed
    PatientUpdate,
    /// A patient's records were listed
    RecordsView,
    /// A record was created
    RecordCreate,
    /// A record was edited
    RecordUpdate,
}

impl AuditAction {
    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QrIssue => "QR_ISSUE",
            Self::QrScan => "QR_SCAN",
            Self::PatientView => "PATIENT_VIEW",
            Self::PatientUpdate => "PATIENT_UPDATE",
            Self::RecordsView => "RECORDS_VIEW",
            Self::RecordCreate => "RECORD_CREATE",
            Self::RecordUpdate => "RECORD_UPDATE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QR_ISSUE" => Ok(Self::QrIssue),
            "QR_SCAN" => Ok(Self::QrScan),
            "PATIENT_VIEW" => Ok(Self::PatientView),
            "PATIENT_UPDATE" => Ok(Self::PatientUpdate),
            "RECORDS_VIEW" => Ok(Self::RecordsView),
            "RECORD_CREATE" => Ok(Self::RecordCreate),
            "RECORD_UPDATE" => Ok(Self::RecordUpdate),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// Outcome recorded with an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The action succeeded
    Success,
    /// Token not found
    NotFound,
    /// Payload malformed
    MalformedPayload,
    /// Payload tampered
    TamperedPayload,
    /// Token expired
    Expired,
    /// Token already consumed
    AlreadyConsumed,
    /// The server failed while handling the action
    InternalError,
}

impl AuditOutcome {
    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::MalformedPayload => "malformed_payload",
            Self::TamperedPayload => "tampered_payload",
            Self::Expired => "expired",
            Self::AlreadyConsumed => "already_consumed",
            Self::InternalError => "internal_error",
        }
    }

    /// Whether the outcome is a success
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<QrTokenError> for AuditOutcome {
    fn from(error: QrTokenError) -> Self {
        match error {
            QrTokenError::NotFound => Self::NotFound,
            QrTokenError::MalformedPayload => Self::MalformedPayload,
            QrTokenError::TamperedPayload => Self::TamperedPayload,
            QrTokenError::Expired => Self::Expired,
            QrTokenError::AlreadyConsumed => Self::AlreadyConsumed,
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "not_found" => Ok(Self::NotFound),
            "malformed_payload" => Ok(Self::MalformedPayload),
            "tampered_payload" => Ok(Self::TamperedPayload),
            "expired" => Ok(Self::Expired),
            "already_consumed" => Ok(Self::AlreadyConsumed),
            "internal_error" => Ok(Self::InternalError),
            other => Err(format!("unknown audit outcome: {other}")),
        }
    }
}

/// Audit entry to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    /// User the action is attributed to
    pub actor_id: Option<Uuid>,
    /// Patient the action concerns, when resolvable
    pub patient_id: Option<Uuid>,
    /// What happened
    pub action: AuditAction,
    /// How it ended
    pub outcome: AuditOutcome,
    /// Free-form context (token id, record id)
    pub detail: Option<String>,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}

/// Persisted audit entry; never updated or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// User the action is attributed to
    pub actor_id: Option<Uuid>,
    /// Patient the action concerns
    pub patient_id: Option<Uuid>,
    /// What happened
    pub action: AuditAction,
    /// How it ended
    pub outcome: AuditOutcome,
    /// Free-form context
    pub detail: Option<String>,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_qr_error_has_outcome() {
        for error in [
            QrTokenError::NotFound,
            QrTokenError::MalformedPayload,
            QrTokenError::TamperedPayload,
            QrTokenError::Expired,
            QrTokenError::AlreadyConsumed,
        ] {
            let outcome = AuditOutcome::from(error);
            assert_eq!(outcome.as_str(), error.kind());
            assert!(!outcome.is_success());
        }
    }

    #[test]
    fn test_action_serializes_as_stored() {
        let json = serde_json::to_value(AuditAction::QrScan).unwrap();
        assert_eq!(json, "QR_SCAN");
        assert_eq!("RECORD_UPDATE".parse(), Ok(AuditAction::RecordUpdate));
    }
}
