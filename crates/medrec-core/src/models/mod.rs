// ABOUTME: Core data models for the medical records portal
// ABOUTME: Re-exports users, patients, records, QR access tokens, and audit entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `User`: an account, either a patient or a staff member
//! - `Patient`: demographic profile owned by a patient user
//! - `Record`: a staff-authored medical record entry
//! - `AccessToken`: a single-use QR access token and its lifecycle state
//! - `AuditEntry`: one append-only line of the compliance trail
//!
//! Models serialize in camelCase because they are returned to the web client
//! as-is.

mod access_token;
mod audit;
mod patient;
mod record;
mod user;

pub use access_token::{AccessToken, ScanTransition, TokenState};
pub use audit::{AuditAction, AuditEntry, AuditOutcome, NewAuditEntry};
pub use patient::{NewPatient, Patient, PatientUpdate};
pub use record::Record;
pub use user::{User, UserRole};
