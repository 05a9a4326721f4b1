// ABOUTME: Integration tests for the append-only access audit trail
// ABOUTME: Verifies one entry per scan attempt and that audit failures never change outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use chrono::Duration;
use common::{create_patient, create_staff, create_test_context, create_test_context_with_sink};
use medrec_portal::audit::AuditSink;
use medrec_portal::errors::{AuditError, ErrorCode};
use medrec_portal::models::{AuditAction, AuditEntry, AuditOutcome, NewAuditEntry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Sink whose storage is always down
#[derive(Default)]
struct FailingSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditSink for FailingSink {
    async fn append(&self, _entry: &NewAuditEntry) -> Result<AuditEntry, AuditError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditError::new("audit storage offline"))
    }
}

/// Sink that keeps entries in memory, independent of the database
#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<NewAuditEntry>>,
}

impl RecordingSink {
    fn entries(&self) -> Vec<NewAuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingSink {
    async fn append(&self, entry: &NewAuditEntry) -> Result<AuditEntry, AuditError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(AuditEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            patient_id: entry.patient_id,
            action: entry.action,
            outcome: entry.outcome,
            detail: entry.detail.clone(),
            timestamp: entry.occurred_at,
        })
    }
}

#[tokio::test]
async fn test_every_scan_attempt_is_recorded() {
    let context = create_test_context().await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();
    let staff = create_staff(&context, "nurse@clinic.org").await.unwrap();
    let qr = &context.resources.qr;

    let code = qr.issue(patient.id, Some(patient.user_id)).await.unwrap();
    qr.scan(&code.payload, Some(staff.id)).await.unwrap();
    qr.scan(&code.payload, Some(staff.id)).await.unwrap_err();
    qr.scan("garbage", Some(staff.id)).await.unwrap_err();

    let scans = context
        .database
        .list_audit_entries_by_action(AuditAction::QrScan)
        .await
        .unwrap();
    let outcomes: Vec<_> = scans.iter().map(|entry| entry.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AuditOutcome::Success,
            AuditOutcome::AlreadyConsumed,
            AuditOutcome::MalformedPayload,
        ]
    );

    assert!(scans.iter().all(|entry| entry.actor_id == Some(staff.id)));
    assert_eq!(scans[0].patient_id, Some(patient.id));
    assert_eq!(scans[1].patient_id, Some(patient.id));
    assert_eq!(scans[2].patient_id, None);

    let token_detail = format!("token_id={}", code.token_id);
    assert_eq!(scans[0].detail.as_deref(), Some(token_detail.as_str()));
    assert_eq!(scans[2].detail, None);
}

#[tokio::test]
async fn test_issue_is_recorded_on_patient_trail() {
    let context = create_test_context().await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();

    let code = context
        .resources
        .qr
        .issue(patient.id, Some(patient.user_id))
        .await
        .unwrap();

    let trail = context
        .database
        .list_audit_entries(patient.id, 100)
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, AuditAction::QrIssue);
    assert_eq!(trail[0].outcome, AuditOutcome::Success);
    assert_eq!(trail[0].actor_id, Some(patient.user_id));
    assert_eq!(
        trail[0].detail.as_deref(),
        Some(format!("token_id={}", code.token_id).as_str())
    );
}

#[tokio::test]
async fn test_expired_scan_records_timestamp_of_attempt() {
    let context = create_test_context().await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();
    let qr = &context.resources.qr;

    let code = qr.issue(patient.id, None).await.unwrap();
    context.clock.advance(Duration::minutes(6));
    qr.scan(&code.payload, None).await.unwrap_err();

    let scans = context
        .database
        .list_audit_entries_by_action(AuditAction::QrScan)
        .await
        .unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].outcome, AuditOutcome::Expired);
    assert_eq!(scans[0].timestamp, code.expires_at + Duration::minutes(1));
}

#[tokio::test]
async fn test_audit_failure_does_not_change_scan_result() {
    let sink = Arc::new(FailingSink::default());
    let context = create_test_context_with_sink(sink.clone()).await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();
    let qr = &context.resources.qr;

    let code = qr.issue(patient.id, None).await.unwrap();
    let access = qr.scan(&code.payload, None).await.unwrap();
    assert_eq!(access.patient_id, patient.id);

    let error = qr.scan(&code.payload, None).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::QrAlreadyConsumed);

    // Issue plus two scans, each attempted once
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_audit_rows_cannot_be_rewritten() {
    let context = create_test_context().await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();
    context.resources.qr.issue(patient.id, None).await.unwrap();

    let update = sqlx::query("UPDATE audit_logs SET outcome = 'success'")
        .execute(context.database.pool())
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM audit_logs")
        .execute(context.database.pool())
        .await;
    assert!(delete.is_err());

    let trail = context
        .database
        .list_audit_entries(patient.id, 100)
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
}

#[tokio::test]
async fn test_storage_failure_during_scan_is_recorded_as_internal_error() {
    let sink = Arc::new(RecordingSink::default());
    let context = create_test_context_with_sink(sink.clone()).await.unwrap();
    let patient = create_patient(&context, "ada@example.com").await.unwrap();
    let staff = create_staff(&context, "nurse@clinic.org").await.unwrap();
    let qr = &context.resources.qr;

    let code = qr.issue(patient.id, None).await.unwrap();
    context.database.pool().close().await;

    let error = qr
        .scan(&code.payload, Some(staff.id))
        .await
        .expect_err("storage is closed");
    assert_eq!(error.code, ErrorCode::DatabaseError);
    assert_eq!(error.code.http_status(), 500);
    assert_eq!(error.kind, None);

    let entries = sink.entries();
    let scan = entries
        .iter()
        .find(|entry| entry.action == AuditAction::QrScan)
        .expect("scan attempt recorded");
    assert_eq!(scan.outcome, AuditOutcome::InternalError);
    assert_eq!(scan.actor_id, Some(staff.id));
    assert_eq!(scan.patient_id, Some(patient.id));
    let token_detail = format!("token_id={}", code.token_id);
    assert_eq!(scan.detail.as_deref(), Some(token_detail.as_str()));
}
