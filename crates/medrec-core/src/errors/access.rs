// ABOUTME: QR access token verification failures and audit trail write failures
// ABOUTME: Each verification kind maps to its own error code and 4xx status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};

/// Why a QR access token was rejected
///
/// These are the only outcomes a scan can fail with besides an internal
/// error. They are reported to the caller and never retried, since tokens
/// are single-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QrTokenError {
    /// No token exists with the id embedded in the payload
    #[error("QR access token not found")]
    NotFound,
    /// The payload could not be split or decoded
    #[error("QR payload is malformed")]
    MalformedPayload,
    /// The integrity tag, secret, or patient binding did not verify
    #[error("QR payload failed integrity verification")]
    TamperedPayload,
    /// The token outlived its expiry
    #[error("QR access token has expired")]
    Expired,
    /// The token was already used, or superseded by a newer token
    #[error("QR access token has already been used")]
    AlreadyConsumed,
}

impl QrTokenError {
    /// Stable snake-case name used in error bodies and audit outcomes
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::MalformedPayload => "malformed_payload",
            Self::TamperedPayload => "tampered_payload",
            Self::Expired => "expired",
            Self::AlreadyConsumed => "already_consumed",
        }
    }

    /// Error code reported over HTTP
    #[must_use]
    pub const fn error_code(self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::QrTokenNotFound,
            Self::MalformedPayload => ErrorCode::QrMalformedPayload,
            Self::TamperedPayload => ErrorCode::QrTamperedPayload,
            Self::Expired => ErrorCode::QrExpired,
            Self::AlreadyConsumed => ErrorCode::QrAlreadyConsumed,
        }
    }
}

impl From<QrTokenError> for AppError {
    fn from(error: QrTokenError) -> Self {
        Self::new(error.error_code(), error.to_string()).with_kind(error.kind())
    }
}

/// The audit trail could not be written
///
/// Kept apart from [`QrTokenError`]: a failed audit write is a server-side
/// persistence problem and never changes a verification outcome.
#[derive(Debug, thiserror::Error)]
#[error("Audit trail write failed: {message}")]
pub struct AuditError {
    /// Description of the storage failure
    pub message: String,
}

impl AuditError {
    /// Create an audit error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AppError> for AuditError {
    fn from(error: AppError) -> Self {
        Self::new(error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_error_converts_with_kind() {
        let error = AppError::from(QrTokenError::AlreadyConsumed);
        assert_eq!(error.code, ErrorCode::QrAlreadyConsumed);
        assert_eq!(error.kind, Some("already_consumed"));
        assert_eq!(error.http_status(), 409);
    }

    #[test]
    fn test_tampered_is_forbidden() {
        assert_eq!(AppError::from(QrTokenError::TamperedPayload).http_status(), 403);
    }
}
