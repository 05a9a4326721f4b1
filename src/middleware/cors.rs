// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Provides Cross-Origin Resource Sharing setup for the portal web client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::environment::ServerConfig;
use crate::constants::headers;
use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS settings for the portal API
///
/// Origins come from `CORS_ORIGINS`: `*` allows any origin, otherwise a
/// comma-separated list is matched exactly.
///
/// # Allowed Headers
///
/// - Standard headers: content-type, accept, origin
/// - CORS headers: x-requested-with, access-control-request-*
/// - Portal headers: x-actor-id, x-request-id
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        if parsed.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("access-control-request-method"),
            HeaderName::from_static("access-control-request-headers"),
            HeaderName::from_static(headers::ACTOR_ID),
            HeaderName::from_static(headers::REQUEST_ID),
        ])
        .expose_headers([HeaderName::from_static(headers::REQUEST_ID)])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
}
