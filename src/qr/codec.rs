// ABOUTME: HMAC-tagged QR payload encoding and decoding
// ABOUTME: Wire format is mrq1.<base64url body>.<base64url HMAC-SHA256 tag>
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # QR Payload Codec
//!
//! A payload is three dot-separated segments:
//!
//! ```text
//! mrq1.<body>.<tag>
//! ```
//!
//! `body` is the base64url (no padding) JSON of [`TokenPayload`]; `tag` is the
//! base64url HMAC-SHA256 over `mrq1.<body>`. The tag is checked before the
//! prefix or body is interpreted, so changing any byte of any segment is
//! reported as tampering rather than as a parse failure.

use crate::constants::qr;
use crate::errors::{AppError, AppResult, QrTokenError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::hmac;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Contents of a QR payload
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Patient the token was issued for
    #[serde(rename = "pid")]
    pub patient_id: Uuid,
    /// Token row id
    #[serde(rename = "tid")]
    pub token_id: Uuid,
    /// Opaque secret, base64url
    #[serde(rename = "sec")]
    pub secret: String,
    /// Issue time in epoch milliseconds
    #[serde(rename = "iat")]
    pub issued_at_ms: i64,
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("patient_id", &self.patient_id)
            .field("token_id", &self.token_id)
            .field("secret", &"<redacted>")
            .field("issued_at_ms", &self.issued_at_ms)
            .finish()
    }
}

/// Encodes and authenticates QR payloads with a server-side key
pub struct TokenCodec {
    key: hmac::Key,
}

impl TokenCodec {
    /// Create a codec from raw key bytes
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, key),
        }
    }

    /// Create a codec from a hex-encoded key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is not hex or is too short
    pub fn from_hex(key_hex: &str) -> AppResult<Self> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| AppError::config(format!("QR signing key is not valid hex: {e}")))?;
        if key.len() < qr::MIN_SIGNING_KEY_BYTES {
            return Err(AppError::config(format!(
                "QR signing key must be at least {} bytes",
                qr::MIN_SIGNING_KEY_BYTES
            )));
        }
        Ok(Self::new(&key))
    }

    /// Render a payload as its wire string
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the payload cannot be encoded
    pub fn encode(&self, payload: &TokenPayload) -> AppResult<String> {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
        let signed = format!("{}{}{body}", qr::PAYLOAD_PREFIX, qr::SEGMENT_SEPARATOR);
        let tag = hmac::sign(&self.key, signed.as_bytes());
        Ok(format!(
            "{signed}{}{}",
            qr::SEGMENT_SEPARATOR,
            URL_SAFE_NO_PAD.encode(tag.as_ref())
        ))
    }

    /// Parse and authenticate a wire string
    ///
    /// # Errors
    ///
    /// - `MalformedPayload` if the string is not three non-empty segments, or
    ///   the authenticated prefix or body is not understood
    /// - `TamperedPayload` if the integrity tag does not verify
    pub fn decode(&self, encoded: &str) -> Result<TokenPayload, QrTokenError> {
        let mut segments = encoded.split(qr::SEGMENT_SEPARATOR);
        let (Some(prefix), Some(body), Some(tag), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(QrTokenError::MalformedPayload);
        };
        if prefix.is_empty() || body.is_empty() || tag.is_empty() {
            return Err(QrTokenError::MalformedPayload);
        }

        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| QrTokenError::TamperedPayload)?;
        let signed = encoded
            .get(..prefix.len() + 1 + body.len())
            .ok_or(QrTokenError::MalformedPayload)?;
        hmac::verify(&self.key, signed.as_bytes(), &tag)
            .map_err(|_| QrTokenError::TamperedPayload)?;

        // Authentic payload from an unknown format version
        if prefix != qr::PAYLOAD_PREFIX {
            return Err(QrTokenError::MalformedPayload);
        }

        let json = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| QrTokenError::MalformedPayload)?;
        serde_json::from_slice(&json).map_err(|_| QrTokenError::MalformedPayload)
    }
}
