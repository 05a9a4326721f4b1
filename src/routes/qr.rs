// ABOUTME: QR code route handlers for issuing and scanning patient access tokens
// ABOUTME: Scan failures are reported with a distinct 4xx status and failure kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! QR access routes
//!
//! - `POST /qr/generate` issues a code for a patient, revoking older ones
//! - `GET /qr/:payload/scan` verifies and consumes a code

use super::actor_from_headers;
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Code generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Patient to issue the code for
    pub patient_id: Uuid,
}

/// QR routes
pub struct QrRoutes;

impl QrRoutes {
    /// Create all QR routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/qr/generate", post(Self::handle_generate))
            .route("/qr/:payload/scan", get(Self::handle_scan))
            .with_state(resources)
    }

    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<GenerateRequest>,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        let issued = resources.qr.issue(request.patient_id, actor_id).await?;
        Ok((StatusCode::CREATED, Json(issued)).into_response())
    }

    async fn handle_scan(
        State(resources): State<Arc<ServerResources>>,
        Path(payload): Path<String>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let actor_id = actor_from_headers(&headers)?;
        let access = resources.qr.scan(&payload, actor_id).await?;
        Ok(Json(access).into_response())
    }
}
