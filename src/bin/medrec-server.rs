// ABOUTME: Server binary for the medical records portal
// ABOUTME: Loads configuration, opens the database, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Medrec Server Binary
//!
//! Starts the portal HTTP API with `SQLite` storage and single-use QR
//! patient access.

use anyhow::{Context, Result};
use clap::Parser;
use medrec_portal::{
    clock::SystemClock,
    config::environment::{DatabaseUrl, ServerConfig},
    database::Database,
    logging,
    resources::ServerResources,
    server,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "medrec-server")]
#[command(about = "Medical records portal with single-use QR patient access")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&url).context("Invalid --database-url")?;
    }
    config.validate()?;

    logging::init_from_env()?;

    info!("Starting medrec server");
    info!("{}", config.summary());

    if let DatabaseUrl::SQLite { path } = &config.database.url {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let database = Database::new(
        &config.database.url.to_connection_string(),
        config.database.max_connections,
    )
    .await?;
    info!("Database ready at {}", config.database.url.to_connection_string());

    let config = Arc::new(config);
    let resources = Arc::new(
        ServerResources::new(database, config.clone(), Arc::new(SystemClock)).await?,
    );

    display_available_endpoints(&config);

    if let Err(e) = server::run(resources).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints
#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(config: &ServerConfig) {
    let host = &config.host;
    let port = config.http_port;

    info!("=== Available API Endpoints ===");
    info!("Health:");
    info!("   Liveness:          GET  http://{host}:{port}/health");
    info!("   Readiness:         GET  http://{host}:{port}/ready");
    info!("Accounts:");
    info!("   Register:          POST http://{host}:{port}/auth/register");
    info!("Patients:");
    info!("   Profile:           GET  http://{host}:{port}/patients/{{id}}");
    info!("   Update Profile:    PUT  http://{host}:{port}/patients/{{id}}");
    info!("   Records:           GET  http://{host}:{port}/patients/{{id}}/records");
    info!("   Add Record:        POST http://{host}:{port}/patients/{{id}}/records");
    info!("   Edit Record:       PUT  http://{host}:{port}/patients/{{id}}/records/{{recordId}}");
    info!("   Audit Trail:       GET  http://{host}:{port}/patients/{{id}}/audit");
    info!("QR Access:");
    info!("   Generate Code:     POST http://{host}:{port}/qr/generate");
    info!("   Scan Code:         GET  http://{host}:{port}/qr/{{payload}}/scan");
    info!("=== End of Endpoint List ===");
}
