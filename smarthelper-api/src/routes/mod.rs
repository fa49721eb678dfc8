/// API route handlers
///
/// Each submodule groups the handlers for one resource under `/v1`.
pub mod applications;
pub mod attendance;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod payments;
pub mod posts;
pub mod reviews;
pub mod uploads;
