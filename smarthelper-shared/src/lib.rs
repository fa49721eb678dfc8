//! # SmartHelper Shared Library
//!
//! This crate contains shared types, utilities, and business logic used by
//! the SmartHelper API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `billing`: Attendance-to-payment reconciliation core
//! - `db`: Connection pooling and migrations
//! - `notify`: Outbound webhook notifications (best-effort)

pub mod auth;
pub mod billing;
pub mod db;
pub mod models;
pub mod notify;

/// Current version of the SmartHelper shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
