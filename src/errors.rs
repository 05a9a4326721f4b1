// ABOUTME: Unified error handling re-exported from medrec-core
// ABOUTME: AppError, ErrorCode, and the QR access error kinds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Error types live in `medrec-core` so the `IntoResponse` impl can sit next
//! to `AppError`. This module re-exports them for the server crate.

pub use medrec_core::errors::*;
