// ABOUTME: Main library entry point for the medical records portal server
// ABOUTME: Provides patient, record, and single-use QR access token REST APIs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Medrec Portal
//!
//! Server side of a patient/staff medical records portal. Patients register
//! and request a QR code; staff scan the code to resolve the patient and
//! work with their records.
//!
//! ## QR access control
//!
//! - **Issuer** (`qr::issuer`): mints a time-limited token for one patient and
//!   revokes any outstanding one
//! - **Codec** (`qr::codec`): packages the token as an HMAC-tagged payload
//! - **Verifier** (`qr::verifier`): decodes, authenticates, and consumes a
//!   token exactly once
//! - **Auditor** (`audit`): appends every attempt to the compliance trail
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use medrec_portal::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("medrec-server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Append-only audit trail writer
pub mod audit;

/// Time source abstraction
pub mod clock;

/// Environment-based configuration
pub mod config;

/// Application constants
pub mod constants;

/// `SQLite` persistence for users, patients, records, tokens, and audit entries
pub mod database;

/// Unified error handling re-exported from the core crate
pub mod errors;

/// Structured logging setup
pub mod logging;

/// HTTP middleware for CORS and request tracing
pub mod middleware;

/// Core data models re-exported from the core crate
pub mod models;

/// QR access token issuing, encoding, and verification
pub mod qr;

/// Shared server state handed to every route
pub mod resources;

/// HTTP route handlers grouped by domain
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;
