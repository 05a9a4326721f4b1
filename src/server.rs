// ABOUTME: HTTP server assembly merging domain routes with tracing, request id, CORS, and timeout layers
// ABOUTME: Runs the axum server until ctrl-c triggers a graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::middleware::{
    attach_request_id, create_request_span, setup_cors, MakePrefixedRequestId,
};
use crate::resources::ServerResources;
use crate::routes::{
    AuditRoutes, AuthRoutes, HealthRoutes, PatientRoutes, QrRoutes, RecordRoutes,
};
use anyhow::{Context, Result};
use axum::body::Body;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let timeout = Duration::from_secs(resources.config.security.request_timeout_secs);
    let cors = setup_cors(&resources.config);

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(PatientRoutes::routes(resources.clone()))
        .merge(RecordRoutes::routes(resources.clone()))
        .merge(AuditRoutes::routes(resources.clone()))
        .merge(QrRoutes::routes(resources))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakePrefixedRequestId))
                .layer(TraceLayer::new_for_http().make_span_with(create_request_span::<Body>))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::from_fn(attach_request_id))
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
}

/// Serve HTTP until shutdown
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let addr = format!(
        "{}:{}",
        resources.config.host, resources.config.http_port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
