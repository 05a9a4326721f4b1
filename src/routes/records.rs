// ABOUTME: Medical record route handlers for listing, creating, and editing records
// ABOUTME: Records are written only by staff and keep their original author on edit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::patients::{load_patient, record_access};
use super::{actor_from_headers, parse_path_id};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{AuditAction, Record, User};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Record creation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    /// Staff member writing the record
    pub author_staff_id: Uuid,
    /// Record body
    pub content: String,
}

/// Record edit request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    /// Staff member making the edit
    pub editor_staff_id: Uuid,
    /// Replacement body
    pub content: String,
}

/// Record listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordListResponse {
    /// Patient the records belong to
    pub patient_id: Uuid,
    /// Records, newest first
    pub records: Vec<Record>,
}

/// Medical record routes
pub struct RecordRoutes;

impl RecordRoutes {
    /// Create all record routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/patients/:patient_id/records",
                get(Self::handle_list_records).post(Self::handle_create_record),
            )
            .route(
                "/patients/:patient_id/records/:record_id",
                put(Self::handle_update_record),
            )
            .with_state(resources)
    }

    async fn handle_list_records(
        State(resources): State<Arc<ServerResources>>,
        Path(patient_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        let patient = load_patient(&resources, &patient_id).await?;
        let records = resources.database.list_records(patient.id).await?;

        record_access(&resources, actor_id, patient.id, AuditAction::RecordsView, None).await;
        Ok(Json(RecordListResponse {
            patient_id: patient.id,
            records,
        })
        .into_response())
    }

    async fn handle_create_record(
        State(resources): State<Arc<ServerResources>>,
        Path(patient_id): Path<String>,
        headers: HeaderMap,
        Json(request): Json<CreateRecordRequest>,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        validate_content(&request.content)?;
        let patient = load_patient(&resources, &patient_id).await?;
        let author = require_staff(&resources, request.author_staff_id).await?;

        let record = Record {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            author_staff_id: author.id,
            content: request.content,
            created_at: resources.clock.now(),
            updated_at: None,
            updated_by_staff_id: None,
        };
        resources.database.create_record(&record).await?;

        record_access(
            &resources,
            actor_id.or(Some(author.id)),
            patient.id,
            AuditAction::RecordCreate,
            Some(format!("record_id={}", record.id)),
        )
        .await;
        Ok((StatusCode::CREATED, Json(record)).into_response())
    }

    async fn handle_update_record(
        State(resources): State<Arc<ServerResources>>,
        Path((patient_id, record_id)): Path<(String, String)>,
        headers: HeaderMap,
        Json(request): Json<UpdateRecordRequest>,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        validate_content(&request.content)?;
        let patient = load_patient(&resources, &patient_id).await?;
        let record_id = parse_path_id(&record_id, "record id")?;

        let existing = resources
            .database
            .get_record(record_id)
            .await?
            .filter(|record| record.patient_id == patient.id)
            .ok_or_else(|| AppError::not_found("Record"))?;
        let editor = require_staff(&resources, request.editor_staff_id).await?;

        let updated = resources
            .database
            .update_record_content(existing.id, &request.content, editor.id, resources.clock.now())
            .await?
            .ok_or_else(|| AppError::not_found("Record"))?;

        record_access(
            &resources,
            actor_id.or(Some(editor.id)),
            patient.id,
            AuditAction::RecordUpdate,
            Some(format!("record_id={}", updated.id)),
        )
        .await;
        Ok(Json(updated).into_response())
    }
}

/// Load a user and require the staff role
async fn require_staff(resources: &ServerResources, user_id: Uuid) -> AppResult<User> {
    let user = resources
        .database
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Staff member"))?;
    if !user.is_staff() {
        AppLogger::log_security_event(
            "non_staff_record_write",
            "medium",
            "record write attempted by a non-staff account",
            Some(user.id),
        );
        return Err(AppError::permission_denied(
            "Only staff members can write records",
        ));
    }
    Ok(user)
}

fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::invalid_input("Record content cannot be empty"));
    }
    if content.chars().count() > limits::MAX_RECORD_CONTENT_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Record content cannot exceed {} characters",
            limits::MAX_RECORD_CONTENT_LENGTH
        )));
    }
    Ok(())
}
