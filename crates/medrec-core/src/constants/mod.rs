// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Header names, QR payload parameters, service names, and input limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants shared by the server crate and its tests.

/// HTTP header names
pub mod headers {
    /// Header carrying the user an audit entry is attributed to
    pub const ACTOR_ID: &str = "x-actor-id";
    /// Request correlation header
    pub const REQUEST_ID: &str = "x-request-id";
}

/// QR access token parameters
pub mod qr {
    /// Version prefix of every encoded payload
    pub const PAYLOAD_PREFIX: &str = "mrq1";
    /// Separator between payload segments
    pub const SEGMENT_SEPARATOR: char = '.';
    /// Bytes of randomness in an opaque token secret
    pub const SECRET_BYTES: usize = 32;
    /// Default token lifetime
    pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 5;
    /// Upper bound on the configurable token lifetime (24 hours)
    pub const MAX_TOKEN_TTL_MINUTES: u32 = 1440;
    /// Minimum HMAC key length
    pub const MIN_SIGNING_KEY_BYTES: usize = 32;
    /// `system_secrets` row holding the generated signing key
    pub const SIGNING_KEY_SECRET_TYPE: &str = "qr_signing_key";
}

/// Service identification
pub mod service_names {
    /// Name used in logs and health output
    pub const MEDREC_SERVER: &str = "medrec-server";
}

/// Input limits
pub mod limits {
    /// Minimum password length accepted at registration
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// Maximum size of a record body
    pub const MAX_RECORD_CONTENT_LENGTH: usize = 20_000;
    /// Maximum length of a patient name
    pub const MAX_FULL_NAME_LENGTH: usize = 255;
    /// Maximum length of a contact number
    pub const MAX_CONTACT_NUMBER_LENGTH: usize = 20;
    /// Default page size for audit trail reads
    pub const DEFAULT_AUDIT_PAGE_SIZE: u32 = 200;
    /// Largest page size a caller may request
    pub const MAX_AUDIT_PAGE_SIZE: u32 = 1000;
}
