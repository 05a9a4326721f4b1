// ABOUTME: Audit trail read-back route for a single patient
// ABOUTME: Returns the append-only access history oldest first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::patients::load_patient;
use crate::constants::limits;
use crate::errors::AppError;
use crate::models::AuditEntry;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Audit trail query parameters
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Maximum number of entries
    pub limit: Option<u32>,
}

/// Audit trail listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailResponse {
    /// Patient the entries concern
    pub patient_id: Uuid,
    /// Entries, oldest first
    pub entries: Vec<AuditEntry>,
}

/// Audit trail routes
pub struct AuditRoutes;

impl AuditRoutes {
    /// Create all audit routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/patients/:patient_id/audit", get(Self::handle_list_audit))
            .with_state(resources)
    }

    async fn handle_list_audit(
        State(resources): State<Arc<ServerResources>>,
        Path(patient_id): Path<String>,
        Query(query): Query<AuditQuery>,
    ) -> Result<Response, AppError> {
        let patient = load_patient(&resources, &patient_id).await?;
        let limit = query
            .limit
            .unwrap_or(limits::DEFAULT_AUDIT_PAGE_SIZE)
            .clamp(1, limits::MAX_AUDIT_PAGE_SIZE);

        let entries = resources
            .database
            .list_audit_entries(patient.id, limit)
            .await?;

        Ok(Json(AuditTrailResponse {
            patient_id: patient.id,
            entries,
        })
        .into_response())
    }
}
