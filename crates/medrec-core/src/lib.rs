// ABOUTME: Core types and constants for the medical records portal
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Medrec Core
//!
//! Foundation crate providing shared types and constants for the medical
//! records portal. It changes infrequently so the server crate can rebuild
//! incrementally on top of it.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and QR access errors
//! - **models**: Users, patients, records, QR access tokens, and audit entries
//! - **constants**: Header names, QR payload parameters, and limits

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models
pub mod models;
