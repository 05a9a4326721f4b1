// ABOUTME: QR access token verifier resolving a scanned payload to its patient
// ABOUTME: Consumption is a single conditional update so a token verifies at most once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Token Verification
//!
//! A scan runs these checks in order, stopping at the first failure:
//!
//! 1. decode the payload and verify its integrity tag
//! 2. look the token up by id
//! 3. match the payload's patient and secret against the stored row
//! 4. apply the state machine (`Pending` consumes, everything else rejects)
//! 5. consume with compare-and-set; a lost race is re-read and classified

use super::codec::{TokenCodec, TokenPayload};
use super::issuer::hash_secret;
use crate::database::Database;
use crate::errors::{AppError, QrTokenError};
use crate::models::{AccessToken, AuditOutcome, ScanTransition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;
use uuid::Uuid;

/// Result of a successful scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAccess {
    /// Consumed token
    pub token_id: Uuid,
    /// Patient whose records the scanner may read
    pub patient_id: Uuid,
    /// When the token was consumed
    pub verified_at: DateTime<Utc>,
}

/// Why a scan did not grant access
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The token was rejected
    #[error(transparent)]
    Rejected(#[from] QrTokenError),
    /// The server failed before reaching a verdict
    #[error(transparent)]
    Internal(#[from] AppError),
}

impl ScanError {
    /// Audit outcome for this failure
    #[must_use]
    pub fn outcome(&self) -> AuditOutcome {
        match self {
            Self::Rejected(kind) => AuditOutcome::from(*kind),
            Self::Internal(_) => AuditOutcome::InternalError,
        }
    }
}

impl From<ScanError> for AppError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Rejected(kind) => kind.into(),
            ScanError::Internal(e) => e,
        }
    }
}

/// A failed scan with whatever identity could be attributed to it
///
/// `patient_id` and `token_id` are only set once the integrity tag verified,
/// so forged payloads never attribute entries to real patients.
#[derive(Debug)]
pub struct ScanFailure {
    /// What went wrong
    pub error: ScanError,
    /// Patient named by an authenticated payload
    pub patient_id: Option<Uuid>,
    /// Token named by an authenticated payload
    pub token_id: Option<Uuid>,
}

impl ScanFailure {
    fn unattributed(error: impl Into<ScanError>) -> Self {
        Self {
            error: error.into(),
            patient_id: None,
            token_id: None,
        }
    }

    fn for_payload(payload: &TokenPayload, error: impl Into<ScanError>) -> Self {
        Self {
            error: error.into(),
            patient_id: Some(payload.patient_id),
            token_id: Some(payload.token_id),
        }
    }
}

/// Verifies scanned payloads
#[derive(Clone)]
pub struct TokenVerifier {
    database: Arc<Database>,
    codec: Arc<TokenCodec>,
}

impl TokenVerifier {
    /// Create a verifier
    #[must_use]
    pub const fn new(database: Arc<Database>, codec: Arc<TokenCodec>) -> Self {
        Self { database, codec }
    }

    /// Verify and consume a scanned payload at `now`
    ///
    /// # Errors
    ///
    /// Returns a [`ScanFailure`] naming the rejection kind, or an internal
    /// error if storage failed
    pub async fn verify(
        &self,
        encoded: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedAccess, ScanFailure> {
        let payload = self.codec.decode(encoded).map_err(ScanFailure::unattributed)?;

        let token = self
            .database
            .get_qr_token(payload.token_id)
            .await
            .map_err(|e| ScanFailure::for_payload(&payload, e))?
            .ok_or_else(|| ScanFailure::for_payload(&payload, QrTokenError::NotFound))?;

        if !payload_matches(&payload, &token) {
            return Err(ScanFailure::for_payload(
                &payload,
                QrTokenError::TamperedPayload,
            ));
        }

        self.transition(&token, now)
            .await
            .map_err(|e| ScanFailure::for_payload(&payload, e))?;

        debug!(token.id = %token.id, patient.id = %token.patient_id, "QR access token consumed");
        Ok(VerifiedAccess {
            token_id: token.id,
            patient_id: token.patient_id,
            verified_at: now,
        })
    }

    async fn transition(&self, token: &AccessToken, now: DateTime<Utc>) -> Result<(), ScanError> {
        match token.state.on_scan(now, token.expires_at)? {
            ScanTransition::Expire => {
                self.database.expire_qr_token(token.id).await?;
                Err(QrTokenError::Expired.into())
            }
            ScanTransition::Consume => {
                if self.database.consume_qr_token(token.id, now).await? {
                    return Ok(());
                }
                // Lost the race: another scan or a reissue changed the row
                let current = self
                    .database
                    .get_qr_token(token.id)
                    .await?
                    .ok_or(QrTokenError::NotFound)?;
                match current.state.on_scan(now, current.expires_at)? {
                    ScanTransition::Expire => {
                        self.database.expire_qr_token(current.id).await?;
                        Err(QrTokenError::Expired.into())
                    }
                    ScanTransition::Consume => Err(QrTokenError::AlreadyConsumed.into()),
                }
            }
        }
    }
}

fn payload_matches(payload: &TokenPayload, token: &AccessToken) -> bool {
    let secret_hash = hash_secret(&payload.secret);
    let secret_ok: bool = secret_hash
        .as_bytes()
        .ct_eq(token.secret_hash.as_bytes())
        .into();
    secret_ok && payload.patient_id == token.patient_id
}
