// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-only configuration for ports, database, QR tokens, and security
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All settings come from environment variables; see
//! [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    DatabaseConfig, DatabaseUrl, Environment, LogLevel, QrConfig, SecurityConfig, ServerConfig,
};
