// ABOUTME: HTTP middleware for request tracing, request IDs, and CORS
// ABOUTME: Provides request ID generation and span creation for structured logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Cross-origin configuration
pub mod cors;
/// Request ids and spans
pub mod tracing;

pub use cors::setup_cors;
pub use self::tracing::{attach_request_id, create_request_span, MakePrefixedRequestId};
