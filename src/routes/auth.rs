// ABOUTME: Account registration route handler for patients and staff
// ABOUTME: Hashes passwords with bcrypt and creates the patient profile with the account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Registration routes
//!
//! There is no login endpoint: the portal records who acted through the
//! `x-actor-id` header and does not issue sessions.

use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::{NewPatient, User, UserRole};
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Account role
    pub role: UserRole,
    /// Patient full name (patients only)
    pub full_name: Option<String>,
    /// Patient date of birth (patients only)
    pub date_of_birth: Option<NaiveDate>,
    /// Patient address
    pub address: Option<String>,
    /// Patient contact number
    pub contact_number: Option<String>,
}

/// Registration response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// New user id
    pub user_id: Uuid,
    /// Account role
    pub role: UserRole,
    /// Patient profile id, for patient accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::handle_register))
            .with_state(resources)
    }

    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if request.password.len() < limits::MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {} characters",
                limits::MIN_PASSWORD_LENGTH
            )));
        }

        let password_hash =
            hash_password(request.password.clone(), resources.config.security.bcrypt_cost).await?;
        let now = resources.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role: request.role,
            created_at: now,
        };

        let patient_id = match request.role {
            UserRole::Staff => {
                resources.database.create_user(&user).await?;
                None
            }
            UserRole::Patient => {
                let profile = patient_profile(&request, user.id)?;
                let patient = resources
                    .database
                    .create_patient_account(&user, profile, now)
                    .await?;
                Some(patient.id)
            }
        };

        info!(user.id = %user.id, role = %user.role, "User registered");

        Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                user_id: user.id,
                role: user.role,
                patient_id,
            }),
        )
            .into_response())
    }
}

/// Build and validate the profile for a patient registration
fn patient_profile(request: &RegisterRequest, user_id: Uuid) -> AppResult<NewPatient> {
    let full_name = request
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::missing_field("fullName"))?;
    let date_of_birth = request
        .date_of_birth
        .ok_or_else(|| AppError::missing_field("dateOfBirth"))?;

    let profile = NewPatient {
        user_id,
        full_name: full_name.to_owned(),
        date_of_birth,
        address: request.address.clone(),
        contact_number: request.contact_number.clone(),
    };
    super::patients::validate_profile_fields(
        Some(&profile.full_name),
        profile.contact_number.as_deref(),
    )?;
    Ok(profile)
}

/// Hash a password off the async executor
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))
}

/// Simple email validation
fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 {
        return false;
    }
    let Some(at_pos) = email.find('@') else {
        return false;
    };
    if at_pos == 0 || at_pos == email.len() - 1 {
        return false;
    }
    email[at_pos + 1..].contains('.')
}
