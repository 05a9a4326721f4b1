// ABOUTME: Patient profile route handlers for lookup and partial update
// ABOUTME: Every read and write is appended to the patient's audit trail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{actor_from_headers, parse_path_id};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{AuditAction, AuditOutcome, NewAuditEntry, Patient, PatientUpdate};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Patient profile routes
pub struct PatientRoutes;

impl PatientRoutes {
    /// Create all patient routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/patients/:patient_id",
                get(Self::handle_get_patient).put(Self::handle_update_patient),
            )
            .with_state(resources)
    }

    async fn handle_get_patient(
        State(resources): State<Arc<ServerResources>>,
        Path(patient_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        let patient = load_patient(&resources, &patient_id).await?;

        record_access(&resources, actor_id, patient.id, AuditAction::PatientView, None).await;
        Ok(Json(patient).into_response())
    }

    async fn handle_update_patient(
        State(resources): State<Arc<ServerResources>>,
        Path(patient_id): Path<String>,
        headers: HeaderMap,
        Json(update): Json<PatientUpdate>,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        if update.is_empty() {
            return Err(AppError::invalid_input("Update contains no fields"));
        }
        validate_profile_fields(update.full_name.as_deref(), update.contact_number.as_deref())?;

        let mut patient = load_patient(&resources, &patient_id).await?;
        update.apply_to(&mut patient);
        patient.updated_at = resources.clock.now();
        resources.database.update_patient(&patient).await?;

        record_access(&resources, actor_id, patient.id, AuditAction::PatientUpdate, None).await;
        Ok(Json(patient).into_response())
    }
}

/// Parse a patient path id and load the profile
///
/// # Errors
///
/// Returns `InvalidInput` for a malformed id and `ResourceNotFound` for an
/// unknown patient
pub(super) async fn load_patient(
    resources: &ServerResources,
    patient_id: &str,
) -> AppResult<Patient> {
    let patient_id = parse_path_id(patient_id, "patient id")?;
    resources
        .database
        .get_patient(patient_id)
        .await?
        .ok_or_else(|| AppError::not_found("Patient"))
}

/// Append a successful access event for a patient
pub(super) async fn record_access(
    resources: &ServerResources,
    actor_id: Option<Uuid>,
    patient_id: Uuid,
    action: AuditAction,
    detail: Option<String>,
) {
    resources
        .auditor
        .record(NewAuditEntry {
            actor_id,
            patient_id: Some(patient_id),
            action,
            outcome: AuditOutcome::Success,
            detail,
            occurred_at: resources.clock.now(),
        })
        .await;
}

/// Check name and contact number limits
pub(super) fn validate_profile_fields(
    full_name: Option<&str>,
    contact_number: Option<&str>,
) -> AppResult<()> {
    if let Some(name) = full_name {
        if name.trim().is_empty() {
            return Err(AppError::invalid_input("Full name cannot be empty"));
        }
        if name.len() > limits::MAX_FULL_NAME_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Full name cannot exceed {} characters",
                limits::MAX_FULL_NAME_LENGTH
            )));
        }
    }
    if let Some(number) = contact_number {
        if number.len() > limits::MAX_CONTACT_NUMBER_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Contact number cannot exceed {} characters",
                limits::MAX_CONTACT_NUMBER_LENGTH
            )));
        }
    }
    Ok(())
}
