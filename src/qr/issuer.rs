// ABOUTME: QR access token issuer minting single-patient, time-limited tokens
// ABOUTME: Reissuing revokes the patient's outstanding token in the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::qr;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{AccessToken, TokenState};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A stored token together with its plaintext secret
///
/// The secret is only available here, at issue time.
pub struct IssuedToken {
    /// Persisted token
    pub token: AccessToken,
    /// Opaque secret, base64url
    pub secret: String,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Mints access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    database: Arc<Database>,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer whose tokens live for `ttl_minutes`
    #[must_use]
    pub fn new(database: Arc<Database>, ttl_minutes: u32) -> Self {
        Self {
            database,
            ttl: Duration::minutes(i64::from(ttl_minutes)),
        }
    }

    /// Token lifetime
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `patient_id`, revoking any pending one
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the patient does not exist, or a
    /// database error
    pub async fn issue(&self, patient_id: Uuid, now: DateTime<Utc>) -> AppResult<IssuedToken> {
        let issued_at = truncate_to_millis(now);
        let secret = generate_secret();
        let token = AccessToken {
            id: Uuid::new_v4(),
            patient_id,
            secret_hash: hash_secret(&secret),
            issued_at,
            expires_at: issued_at + self.ttl,
            state: TokenState::Pending,
            consumed_at: None,
        };

        self.database.issue_qr_token(&token).await?;
        debug!(token.id = %token.id, patient.id = %patient_id, "Issued QR access token");

        Ok(IssuedToken { token, secret })
    }
}

/// Random opaque secret from the OS RNG
fn generate_secret() -> String {
    let mut bytes = [0u8; qr::SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a secret for storage
pub(crate) fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_unique_and_sized() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert_eq!(URL_SAFE_NO_PAD.decode(&a).unwrap().len(), qr::SECRET_BYTES);
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = hash_secret("secret");
        assert_eq!(hash, hash_secret("secret"));
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, hash_secret("secreT"));
    }
}
