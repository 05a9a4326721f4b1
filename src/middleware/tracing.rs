// ABOUTME: Request tracing middleware for correlation and structured logging
// ABOUTME: Generates request IDs and creates spans for all HTTP requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::headers;
use axum::body::{to_bytes, Body};
use axum::extract::Request as AxumRequest;
use axum::middleware::Next;
use axum::response::Response;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Generates `req_<uuid>` request IDs for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakePrefixedRequestId;

impl MakeRequestId for MakePrefixedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&format!("req_{}", Uuid::new_v4().simple()))
            .ok()
            .map(RequestId::new)
    }
}

/// Create a tracing span for an HTTP request
///
/// Used as the `TraceLayer` span maker; runs after the request id is set.
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(headers::REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        status_code = tracing::field::Empty,
    )
}

/// Upper bound on an error body rewritten by [`attach_request_id`]
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// Copy the request id into the `error.request_id` field of JSON error bodies
///
/// Must run inside `SetRequestIdLayer` so the request header is present.
pub async fn attach_request_id(request: AxumRequest, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(headers::REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;

    let Some(request_id) = request_id else {
        return response;
    };
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if response.status().is_success() || !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not buffer error body for request id");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    let Some(error) = value.get_mut("error").and_then(|e| e.as_object_mut()) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    error.insert("request_id".to_owned(), serde_json::Value::String(request_id));

    match serde_json::to_vec(&value) {
        Ok(rewritten) => {
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rewritten))
        }
        Err(_) => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_request_id_is_prefixed() {
        let request = Request::new(());
        let id = MakePrefixedRequestId
            .make_request_id(&request)
            .unwrap();
        assert!(id.header_value().to_str().unwrap().starts_with("req_"));
    }
}
