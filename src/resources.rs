// ABOUTME: Centralized resource container shared by every HTTP route
// ABOUTME: Builds the database handle, QR access service, auditor, and clock once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Shared server resources
//!
//! Expensive or stateful components are created once and handed to routes
//! as `Arc<ServerResources>`.

use crate::audit::{AccessAuditor, AuditSink};
use crate::clock::Clock;
use crate::config::environment::ServerConfig;
use crate::constants::qr;
use crate::database::Database;
use crate::errors::AppResult;
use crate::qr::{QrAccessService, TokenCodec};
use std::sync::Arc;
use tracing::info;

/// Resources shared by all route handlers
#[derive(Clone)]
pub struct ServerResources {
    /// Storage
    pub database: Arc<Database>,
    /// QR issue and scan service
    pub qr: QrAccessService,
    /// Audit trail writer for non-QR access events
    pub auditor: AccessAuditor,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create resources, resolving the QR signing key
    ///
    /// The key comes from `QR_SIGNING_KEY` when configured; otherwise it is
    /// generated once and persisted in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing key is invalid or cannot be loaded
    pub async fn new(
        database: Database,
        config: Arc<ServerConfig>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let database = Arc::new(database);
        let codec = if let Some(key_hex) = &config.qr.signing_key_hex {
            info!("Using configured QR signing key");
            TokenCodec::from_hex(key_hex)?
        } else {
            let key_hex = database
                .get_or_create_system_secret(qr::SIGNING_KEY_SECRET_TYPE)
                .await?;
            info!("Using persisted QR signing key");
            TokenCodec::from_hex(&key_hex)?
        };

        let sink: Arc<dyn AuditSink> = database.clone();
        Ok(Self::from_parts(database, codec, sink, clock, config))
    }

    /// Assemble resources from already-built components
    #[must_use]
    pub fn from_parts(
        database: Arc<Database>,
        codec: TokenCodec,
        audit_sink: Arc<dyn AuditSink>,
        clock: Arc<dyn Clock>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let auditor = AccessAuditor::new(audit_sink);
        let qr = QrAccessService::new(
            database.clone(),
            Arc::new(codec),
            auditor.clone(),
            clock.clone(),
            config.qr.token_ttl_minutes,
        );
        Self {
            database,
            qr,
            auditor,
            clock,
            config,
        }
    }
}
