// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Re-exports core constants and adds environment-derived defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Shared constants come from `medrec-core`; `env_config` reads the
//! environment with the server's defaults.

use std::env;

pub use medrec_core::constants::*;

/// Server defaults
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8080;
    /// Default bind address
    pub const HOST: &str = "127.0.0.1";
    /// Default database location
    pub const DATABASE_URL: &str = "sqlite:./data/medrec.db";
    /// Default pool size for file-backed databases
    pub const DATABASE_MAX_CONNECTIONS: u32 = 8;
    /// `SQLite` busy timeout
    pub const DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;
    /// Default per-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Default bcrypt cost
    pub const BCRYPT_COST: u32 = 12;
}

/// Environment-based configuration
pub mod env_config {
    use super::{defaults, env};

    /// Get HTTP server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::HTTP_PORT)
    }

    /// Get bind address from environment or default
    #[must_use]
    pub fn host() -> String {
        env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_owned())
    }

    /// Get database URL from environment or default
    #[must_use]
    pub fn database_url() -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_owned())
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned())
    }
}
