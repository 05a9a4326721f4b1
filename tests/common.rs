// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides database, clock, resource, and account creation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `medrec_portal`

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use medrec_portal::{
    audit::AuditSink,
    clock::{Clock, ManualClock},
    config::environment::ServerConfig,
    database::Database,
    models::{NewPatient, Patient, User, UserRole},
    qr::TokenCodec,
    resources::ServerResources,
};
use std::path::Path;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Key every test codec signs with
pub const TEST_SIGNING_KEY: [u8; 32] = [0x5a; 32];

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed starting instant for manual clocks
pub fn test_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// Everything a test needs to drive the portal
pub struct TestContext {
    pub resources: Arc<ServerResources>,
    pub database: Arc<Database>,
    pub clock: Arc<ManualClock>,
}

/// Configuration tuned for tests
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.security.bcrypt_cost = 4;
    config
}

/// In-memory database with audit entries written to the same database
pub async fn create_test_context() -> Result<TestContext> {
    init_test_logging();
    let database = Arc::new(Database::new("sqlite::memory:", 1).await?);
    let sink: Arc<dyn AuditSink> = database.clone();
    Ok(build_context(database, sink))
}

/// In-memory database with audit entries sent to `sink`
pub async fn create_test_context_with_sink(sink: Arc<dyn AuditSink>) -> Result<TestContext> {
    init_test_logging();
    let database = Arc::new(Database::new("sqlite::memory:", 1).await?);
    Ok(build_context(database, sink))
}

/// File-backed database with a real connection pool
pub async fn create_file_test_context(dir: &Path) -> Result<TestContext> {
    init_test_logging();
    let url = format!("sqlite:{}", dir.join("medrec_test.db").display());
    let database = Arc::new(Database::new(&url, 8).await?);
    let sink: Arc<dyn AuditSink> = database.clone();
    Ok(build_context(database, sink))
}

fn build_context(database: Arc<Database>, sink: Arc<dyn AuditSink>) -> TestContext {
    let clock = Arc::new(ManualClock::new(test_start_time()));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let resources = Arc::new(ServerResources::from_parts(
        database.clone(),
        TokenCodec::new(&TEST_SIGNING_KEY),
        sink,
        dyn_clock,
        Arc::new(test_config()),
    ));
    TestContext {
        resources,
        database,
        clock,
    }
}

fn test_user(email: &str, role: UserRole, at: DateTime<Utc>) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_owned(),
        password_hash: "$2b$04$testhashtesthashtesthash".to_owned(),
        role,
        created_at: at,
    }
}

/// Create a staff account
pub async fn create_staff(context: &TestContext, email: &str) -> Result<User> {
    let user = test_user(email, UserRole::Staff, context.clock.now());
    context.database.create_user(&user).await?;
    Ok(user)
}

/// Create a patient account with its profile
pub async fn create_patient(context: &TestContext, email: &str) -> Result<Patient> {
    let now = context.clock.now();
    let user = test_user(email, UserRole::Patient, now);
    let profile = NewPatient {
        user_id: user.id,
        full_name: "Ada Lovelace".to_owned(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 12, 10).unwrap(),
        address: Some("12 St James's Square".to_owned()),
        contact_number: Some("+44 20 7946 0000".to_owned()),
    };
    Ok(context
        .database
        .create_patient_account(&user, profile, now)
        .await?)
}
