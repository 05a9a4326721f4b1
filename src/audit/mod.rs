// ABOUTME: Access auditor that appends every QR issuance and scan to the audit trail
// ABOUTME: Audit write failures are logged and reported but never change a scan outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Access Audit
//!
//! Every verification attempt, successful or not, produces exactly one
//! `QR_SCAN` entry. The auditor writes through an [`AuditSink`] so the
//! storage can be swapped in tests.

use crate::errors::AuditError;
use crate::logging::AppLogger;
use crate::models::{AuditAction, AuditEntry, AuditOutcome, NewAuditEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Append-only destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be stored
    async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry, AuditError>;
}

/// Records access events to an [`AuditSink`]
#[derive(Clone)]
pub struct AccessAuditor {
    sink: Arc<dyn AuditSink>,
}

impl AccessAuditor {
    /// Create an auditor writing to `sink`
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record a QR scan attempt
    ///
    /// `patient_id` is only set once the payload's integrity tag verified.
    pub async fn record_scan(
        &self,
        actor_id: Option<Uuid>,
        patient_id: Option<Uuid>,
        token_id: Option<Uuid>,
        outcome: AuditOutcome,
        at: DateTime<Utc>,
    ) -> Option<AuditEntry> {
        AppLogger::log_qr_scan(outcome.as_str(), patient_id, actor_id);
        self.record(NewAuditEntry {
            actor_id,
            patient_id,
            action: AuditAction::QrScan,
            outcome,
            detail: token_id.map(|id| format!("token_id={id}")),
            occurred_at: at,
        })
        .await
    }

    /// Record an access event
    ///
    /// Returns the stored entry, or `None` if the write failed; the failure
    /// is logged rather than propagated.
    pub async fn record(&self, entry: NewAuditEntry) -> Option<AuditEntry> {
        match self.sink.append(&entry).await {
            Ok(stored) => {
                debug!(
                    audit.id = %stored.id,
                    audit.action = %stored.action,
                    audit.outcome = %stored.outcome,
                    "Audit entry appended"
                );
                Some(stored)
            }
            Err(e) => {
                AppLogger::log_audit_failure(
                    entry.action.as_str(),
                    entry.outcome.as_str(),
                    &e.to_string(),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        entries: Mutex<Vec<AuditEntry>>,
    }

    #[async_trait]
    impl AuditSink for MemorySink {
        async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry, AuditError> {
            let stored = AuditEntry {
                id: Uuid::new_v4(),
                actor_id: entry.actor_id,
                patient_id: entry.patient_id,
                action: entry.action,
                outcome: entry.outcome,
                detail: entry.detail.clone(),
                timestamp: entry.occurred_at,
            };
            self.entries.lock().unwrap().push(stored.clone());
            Ok(stored)
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _entry: &NewAuditEntry) -> Result<AuditEntry, AuditError> {
            Err(AuditError::new("disk full"))
        }
    }

    #[tokio::test]
    async fn test_scan_entry_carries_token_detail() {
        let sink = Arc::new(MemorySink::default());
        let auditor = AccessAuditor::new(sink.clone());
        let token_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();

        let entry = auditor
            .record_scan(
                None,
                Some(patient_id),
                Some(token_id),
                AuditOutcome::Expired,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(entry.action, AuditAction::QrScan);
        assert_eq!(entry.outcome, AuditOutcome::Expired);
        assert_eq!(entry.detail, Some(format!("token_id={token_id}")));
        assert_eq!(sink.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let auditor = AccessAuditor::new(Arc::new(FailingSink));
        let entry = auditor
            .record_scan(None, None, None, AuditOutcome::MalformedPayload, Utc::now())
            .await;
        assert!(entry.is_none());
    }
}
