// ABOUTME: QR access token model and its verification state machine
// ABOUTME: Pending tokens are consumed once or expire; reissue revokes them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::QrTokenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of an access token
///
/// ```text
/// Pending --scan ok--> Consumed
/// Pending --scan after expiry--> Expired
/// Pending --reissue--> Revoked
/// ```
///
/// Every state other than `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    /// Issued, not yet scanned
    Pending,
    /// Scanned successfully
    Consumed,
    /// Scanned after its expiry
    Expired,
    /// Superseded by a newer token for the same patient
    Revoked,
}

/// What a scan should do to a token, given its state and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTransition {
    /// Move `Pending -> Consumed` and grant access
    Consume,
    /// Move `Pending -> Expired` and reject
    Expire,
}

impl TokenState {
    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Consumed => "consumed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    /// Whether the token has been used up, by a scan or by reissue
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed | Self::Revoked)
    }

    /// Decide the transition for a scan at `now`
    ///
    /// Consumption is checked before expiry, so replaying a used token
    /// reports `AlreadyConsumed` even once it is also past its expiry.
    ///
    /// # Errors
    ///
    /// Returns the rejection kind when the token cannot be consumed.
    pub fn on_scan(
        self,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ScanTransition, QrTokenError> {
        match self {
            Self::Consumed | Self::Revoked => Err(QrTokenError::AlreadyConsumed),
            Self::Expired => Err(QrTokenError::Expired),
            Self::Pending if now > expires_at => Ok(ScanTransition::Expire),
            Self::Pending => Ok(ScanTransition::Consume),
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "consumed" => Ok(Self::Consumed),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            other => Err(format!("unknown token state: {other}")),
        }
    }
}

/// Persisted QR access token
///
/// Only the SHA-256 hash of the opaque secret is kept; the secret itself
/// exists solely inside the encoded payload handed to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Unique token ID
    pub id: Uuid,
    /// Patient this token grants access to
    pub patient_id: Uuid,
    /// Hex SHA-256 of the opaque secret
    #[serde(skip_serializing)]
    pub secret_hash: String,
    /// Issue time
    pub issued_at: DateTime<Utc>,
    /// Expiry time
    pub expires_at: DateTime<Utc>,
    /// Lifecycle state
    pub state: TokenState,
    /// Time of the successful scan
    pub consumed_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Whether the token has been used up
    #[must_use]
    pub const fn consumed(&self) -> bool {
        self.state.is_consumed()
    }
}
