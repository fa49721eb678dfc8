/// Database models for SmartHelper
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Family and helper accounts
/// - `job`: Jobs posted by families, with assignment lifecycle
/// - `application`: Helper applications to jobs
/// - `face`: Face templates gating attendance scanning
/// - `attendance`: Immutable check-in/check-out events
/// - `payment`: Billing records materialized from attendance
/// - `review`: One review per job, by the paying family
/// - `post`: Helper social feed posts and followers
///
/// # Example
///
/// ```no_run
/// use smarthelper_shared::models::user::{CreateUser, User, UserRole};
/// use smarthelper_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Maria Garcia".to_string(),
///     email: "maria@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Helper,
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub mod application;
pub mod attendance;
pub mod face;
pub mod job;
pub mod payment;
pub mod post;
pub mod review;
pub mod user;
