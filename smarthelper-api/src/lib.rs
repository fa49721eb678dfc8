//! # SmartHelper API Server
//!
//! HTTP API for the SmartHelper marketplace, exposed as a library so
//! integration tests can build the router without binding a socket.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
