// ABOUTME: Core data models re-exported from medrec-core
// ABOUTME: Users, patients, records, QR access tokens, and audit entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use medrec_core::models::*;
