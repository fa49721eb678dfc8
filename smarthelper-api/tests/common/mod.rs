/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Seeded family and helper accounts
/// - JWT token generation
/// - API client helpers
use smarthelper_api::app::{build_router, AppState};
use smarthelper_api::config::Config;
use smarthelper_shared::auth::jwt::{create_token, Claims, TokenType};
use smarthelper_shared::models::job::{CreateJob, Job};
use smarthelper_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub family: User,
    pub helper: User,
    pub family_token: String,
    pub helper_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh family and helper account
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../smarthelper-shared/migrations")
            .run(&db)
            .await?;

        let family = User::create(
            &db,
            CreateUser {
                name: "Test Family".to_string(),
                email: format!("family-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(), // Not used in tests
                role: UserRole::Family,
            },
        )
        .await?;

        let helper = User::create(
            &db,
            CreateUser {
                name: "Test Helper".to_string(),
                email: format!("helper-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
                role: UserRole::Helper,
            },
        )
        .await?;

        let family_claims = Claims::new(family.id, UserRole::Family, TokenType::Access);
        let family_token = create_token(&family_claims, &config.jwt.secret)?;

        let helper_claims = Claims::new(helper.id, UserRole::Helper, TokenType::Access);
        let helper_token = create_token(&helper_claims, &config.jwt.secret)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            family,
            helper,
            family_token,
            helper_token,
        })
    }

    /// Authorization header for the family account
    pub fn family_auth(&self) -> String {
        format!("Bearer {}", self.family_token)
    }

    /// Authorization header for the helper account
    pub fn helper_auth(&self) -> String {
        format!("Bearer {}", self.helper_token)
    }

    /// Cleans up the rows created for this context's accounts
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let ids = [self.family.id, self.helper.id];

        sqlx::query("DELETE FROM attendance WHERE helper_id = ANY($1) OR family_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM reviews WHERE family_id = ANY($1) OR helper_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM payments WHERE family_id = ANY($1) OR helper_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM applications WHERE helper_id = ANY($1) OR job_id IN (SELECT id FROM jobs WHERE family_id = ANY($1))")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM faces WHERE helper_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM followers WHERE author_id = ANY($1) OR follower_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM posts WHERE author_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM jobs WHERE family_id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&ids[..])
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// Creates a job for the context's family, assigned to its helper
pub async fn create_assigned_job(ctx: &TestContext, pay_per_hour: i64) -> anyhow::Result<Job> {
    let job = Job::create(
        &ctx.db,
        CreateJob {
            family_id: ctx.family.id,
            title: "Housekeeping".to_string(),
            description: Some("Weekly cleaning".to_string()),
            location: Some("Bedok".to_string()),
            date: Some("2026-04-01".to_string()),
            time: Some("09:00".to_string()),
            duration: Some("8 hours".to_string()),
            pay_per_hour,
            category: Some("Housekeeping".to_string()),
        },
    )
    .await?;

    sqlx::query("UPDATE jobs SET assigned_helper_id = $1, status = 'assigned' WHERE id = $2")
        .bind(ctx.helper.id)
        .bind(job.id)
        .execute(&ctx.db)
        .await?;

    Ok(job)
}

/// Inserts an attendance event with an explicit timestamp
pub async fn insert_attendance_at(
    ctx: &TestContext,
    job_id: Uuid,
    action: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO attendance (helper_id, job_id, family_id, action, created_at) \
         VALUES ($1, $2, $3, $4::attendance_action, $5)",
    )
    .bind(ctx.helper.id)
    .bind(job_id)
    .bind(ctx.family.id)
    .bind(action)
    .bind(at)
    .execute(&ctx.db)
    .await?;

    Ok(())
}

/// Reads a JSON response body
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
