// ABOUTME: Unified error handling with standard error codes and HTTP response mapping
// ABOUTME: Defines AppError, ErrorCode, ErrorResponse, and the QR access error kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Centralized error types for the portal. Every handler returns
//! [`AppResult`]; the `http-response` feature renders [`AppError`] as a JSON
//! error body with the status code carried by its [`ErrorCode`].

/// QR access token and audit trail errors
pub mod access;

pub use access::{AuditError, QrTokenError};

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// The request carried invalid data
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A required field was absent
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    /// A field had the wrong shape
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,
    /// The actor may not perform this action
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 3003,

    // Resource Management (4000-4999)
    /// Resource lookup failed
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// Unique constraint violated
    #[serde(rename = "RESOURCE_ALREADY_EXISTS")]
    ResourceAlreadyExists = 4001,
    /// Dependency (usually the database) is unreachable
    #[serde(rename = "RESOURCE_UNAVAILABLE")]
    ResourceUnavailable = 4003,

    // QR access tokens (5000-5999)
    /// Payload could not be parsed
    #[serde(rename = "QR_MALFORMED_PAYLOAD")]
    QrMalformedPayload = 5000,
    /// Payload failed integrity verification
    #[serde(rename = "QR_TAMPERED_PAYLOAD")]
    QrTamperedPayload = 5001,
    /// Token id does not exist
    #[serde(rename = "QR_TOKEN_NOT_FOUND")]
    QrTokenNotFound = 5002,
    /// Token was already used or superseded
    #[serde(rename = "QR_TOKEN_ALREADY_CONSUMED")]
    QrAlreadyConsumed = 5003,
    /// Token lifetime elapsed
    #[serde(rename = "QR_TOKEN_EXPIRED")]
    QrExpired = 5004,

    // Configuration (6000-6999)
    /// Invalid or missing configuration
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected server failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    /// Data could not be serialized
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput
            | Self::MissingRequiredField
            | Self::InvalidFormat
            | Self::QrMalformedPayload => 400,

            Self::PermissionDenied | Self::QrTamperedPayload => 403,

            Self::ResourceNotFound | Self::QrTokenNotFound => 404,

            Self::ResourceAlreadyExists | Self::QrAlreadyConsumed => 409,

            Self::QrExpired => 410,

            Self::ResourceUnavailable => 503,

            Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InvalidFormat => "The data format is invalid",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ResourceAlreadyExists => "A resource with this identifier already exists",
            Self::ResourceUnavailable => "The resource is temporarily unavailable",
            Self::QrMalformedPayload => "The QR payload could not be decoded",
            Self::QrTamperedPayload => "The QR payload failed integrity verification",
            Self::QrTokenNotFound => "The QR access token does not exist",
            Self::QrAlreadyConsumed => "The QR access token has already been used",
            Self::QrExpired => "The QR access token has expired",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable failure kind (set for QR verification failures)
    pub kind: Option<&'static str>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: None,
            source: None,
        }
    }

    /// Attach a machine-readable failure kind
    #[must_use]
    pub const fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// Actor lacks the role required for the action
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Unique constraint conflict
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Dependency unavailable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceUnavailable, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Failure kind for QR verification errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Request correlation id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                kind: error.kind.map(str::to_owned),
                request_id: None,
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(
            ErrorCode::SerializationError,
            format!("JSON serialization failed: {error}"),
        )
        .with_source(error)
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use super::{AppError, ErrorResponse};
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;
    use tracing::{error, warn};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                error!(
                    error.code = ?self.code,
                    error.message = %self.message,
                    error.source = ?self.source,
                    "Request failed with server error"
                );
            } else {
                warn!(
                    error.code = ?self.code,
                    error.kind = self.kind.unwrap_or(""),
                    error.message = %self.message,
                    "Request rejected"
                );
            }

            (status, Json(ErrorResponse::from(self))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_qr_codes_map_to_distinct_client_errors() {
        let statuses = [
            ErrorCode::QrMalformedPayload.http_status(),
            ErrorCode::QrTamperedPayload.http_status(),
            ErrorCode::QrTokenNotFound.http_status(),
            ErrorCode::QrAlreadyConsumed.http_status(),
            ErrorCode::QrExpired.http_status(),
        ];
        for (i, a) in statuses.iter().enumerate() {
            assert!((400..500).contains(a));
            for b in &statuses[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::from(QrTokenError::Expired);
        let json = serde_json::to_value(ErrorResponse::from(error)).unwrap();

        assert_eq!(json["error"]["code"], "QR_TOKEN_EXPIRED");
        assert_eq!(json["error"]["kind"], "expired");
        assert!(json["error"].get("request_id").is_none());
    }

    #[test]
    fn test_kind_omitted_for_plain_errors() {
        let json = serde_json::to_value(ErrorResponse::from(AppError::not_found("Patient"))).unwrap();
        assert_eq!(json["error"]["message"], "Patient not found");
        assert!(json["error"].get("kind").is_none());
    }
}
