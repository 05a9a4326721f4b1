// ABOUTME: QR patient access control combining issuer, codec, verifier, and auditor
// ABOUTME: Every issuance and scan attempt is appended to the audit trail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # QR Access Tokens
//!
//! A patient requests a code; staff scan it once within its lifetime to
//! resolve the patient. [`QrAccessService`] ties the pieces together and is
//! what the HTTP routes call.

/// Payload wire format
pub mod codec;
/// Token minting
pub mod issuer;
/// Scan verification
pub mod verifier;

pub use codec::{TokenCodec, TokenPayload};
pub use issuer::{IssuedToken, TokenIssuer};
pub use verifier::{ScanError, ScanFailure, TokenVerifier, VerifiedAccess};

use crate::audit::AccessAuditor;
use crate::clock::Clock;
use crate::database::Database;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::logging::AppLogger;
use crate::models::{AuditAction, AuditOutcome, NewAuditEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A freshly issued code, ready to render as a QR image
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    /// Token id
    pub token_id: Uuid,
    /// Encoded payload
    pub payload: String,
    /// Expiry
    pub expires_at: DateTime<Utc>,
}

/// Issue and scan entry points with auditing
#[derive(Clone)]
pub struct QrAccessService {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    codec: Arc<TokenCodec>,
    auditor: AccessAuditor,
    clock: Arc<dyn Clock>,
}

impl QrAccessService {
    /// Assemble the service
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        codec: Arc<TokenCodec>,
        auditor: AccessAuditor,
        clock: Arc<dyn Clock>,
        ttl_minutes: u32,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(database.clone(), ttl_minutes),
            verifier: TokenVerifier::new(database, codec.clone()),
            codec,
            auditor,
            clock,
        }
    }

    /// Issue a code for a patient
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown patient, or a database error
    pub async fn issue(&self, patient_id: Uuid, actor_id: Option<Uuid>) -> AppResult<IssuedCode> {
        let now = self.clock.now();
        let issued = match self.issuer.issue(patient_id, now).await {
            Ok(issued) => issued,
            Err(e) => {
                let outcome = if e.code == ErrorCode::ResourceNotFound {
                    AuditOutcome::NotFound
                } else {
                    AuditOutcome::InternalError
                };
                self.audit_issue(actor_id, patient_id, outcome, None, now)
                    .await;
                return Err(e);
            }
        };

        let payload = self.codec.encode(&TokenPayload {
            patient_id,
            token_id: issued.token.id,
            secret: issued.secret,
            issued_at_ms: issued.token.issued_at.timestamp_millis(),
        })?;

        self.audit_issue(
            actor_id,
            patient_id,
            AuditOutcome::Success,
            Some(issued.token.id),
            now,
        )
        .await;
        AppLogger::log_qr_issued(patient_id, issued.token.id, actor_id);

        Ok(IssuedCode {
            token_id: issued.token.id,
            payload,
            expires_at: issued.token.expires_at,
        })
    }

    /// Verify a scanned payload and record the attempt
    ///
    /// The audit write is awaited but its failure never changes the result.
    ///
    /// # Errors
    ///
    /// Returns the rejection as an `AppError` carrying the failure kind
    pub async fn scan(&self, encoded: &str, actor_id: Option<Uuid>) -> AppResult<VerifiedAccess> {
        let now = self.clock.now();
        match self.verifier.verify(encoded, now).await {
            Ok(access) => {
                self.auditor
                    .record_scan(
                        actor_id,
                        Some(access.patient_id),
                        Some(access.token_id),
                        AuditOutcome::Success,
                        now,
                    )
                    .await;
                Ok(access)
            }
            Err(failure) => {
                self.auditor
                    .record_scan(
                        actor_id,
                        failure.patient_id,
                        failure.token_id,
                        failure.error.outcome(),
                        now,
                    )
                    .await;
                Err(AppError::from(failure.error))
            }
        }
    }

    /// Token lifetime handed out by the issuer
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        self.issuer.ttl()
    }

    async fn audit_issue(
        &self,
        actor_id: Option<Uuid>,
        patient_id: Uuid,
        outcome: AuditOutcome,
        token_id: Option<Uuid>,
        at: DateTime<Utc>,
    ) {
        self.auditor
            .record(NewAuditEntry {
                actor_id,
                patient_id: Some(patient_id),
                action: AuditAction::QrIssue,
                outcome,
                detail: token_id.map(|id| format!("token_id={id}")),
                occurred_at: at,
            })
            .await;
    }
}
