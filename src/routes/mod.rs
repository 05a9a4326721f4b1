// ABOUTME: Route module organization for the medical records portal HTTP endpoints
// ABOUTME: Provides route definitions organized by domain plus shared request helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the portal
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the database and the QR access service.

/// Patient access audit trail routes
pub mod audit;
/// Account registration routes
pub mod auth;
/// Health check and readiness routes
pub mod health;
/// Patient profile routes
pub mod patients;
/// QR code issue and scan routes
pub mod qr;
/// Medical record routes
pub mod records;

pub use audit::AuditRoutes;
pub use auth::AuthRoutes;
pub use health::HealthRoutes;
pub use patients::PatientRoutes;
pub use qr::QrRoutes;
pub use records::RecordRoutes;

use crate::constants::headers::ACTOR_ID;
use crate::errors::{AppError, AppResult};
use axum::http::HeaderMap;
use uuid::Uuid;

/// Read the optional `x-actor-id` header
///
/// # Errors
///
/// Returns `InvalidInput` if the header is present but not a UUID
pub fn actor_from_headers(headers: &HeaderMap) -> AppResult<Option<Uuid>> {
    headers
        .get(ACTOR_ID)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|v| Uuid::parse_str(v.trim()).ok())
                .ok_or_else(|| {
                    AppError::invalid_input(format!("{ACTOR_ID} must be a UUID"))
                })
        })
        .transpose()
}

/// Parse a UUID path segment
///
/// # Errors
///
/// Returns `InvalidInput` naming the segment if it is not a UUID
pub fn parse_path_id(value: &str, name: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| AppError::invalid_input(format!("Invalid {name}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_header_parsing() {
        let mut map = HeaderMap::new();
        assert_eq!(actor_from_headers(&map).unwrap(), None);

        let id = Uuid::new_v4();
        map.insert(
            ACTOR_ID,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );
        assert_eq!(actor_from_headers(&map).unwrap(), Some(id));

        map.insert(ACTOR_ID, HeaderValue::from_static("nurse"));
        assert!(actor_from_headers(&map).is_err());
    }
}
