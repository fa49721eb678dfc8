/// Review model and database operations
///
/// One review per job, written by the family after the job has been paid.
/// Preconditions for creation:
///
/// 1. the job belongs to the reviewing family,
/// 2. at least one `paid` (or `received`) payment exists for the job,
/// 3. no review exists for the job yet.
///
/// Reviews aggregate into a helper's public rating.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Reasons a review cannot be created
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// The job does not exist or belongs to another family
    #[error("Job not found")]
    JobNotFound,

    /// The job has no paid payment yet
    #[error("Job has not been paid yet")]
    NotPaid,

    /// The job already has a review
    #[error("Job already reviewed")]
    AlreadyReviewed,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Review model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    /// Unique review ID
    pub id: Uuid,

    /// Reviewed job (one review per job)
    pub job_id: Uuid,

    /// Reviewing family
    pub family_id: Uuid,

    /// Reviewed helper
    pub helper_id: Uuid,

    /// Star rating, 1 through 5
    pub rating: i32,

    /// Optional free-text comment
    pub comment: Option<String>,

    /// When the review was written
    pub created_at: DateTime<Utc>,
}

/// Input for creating a review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    /// Job being reviewed
    pub job_id: Uuid,

    /// Star rating, 1 through 5
    pub rating: i32,

    /// Optional free-text comment
    pub comment: Option<String>,
}

/// Review joined with display fields for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewWithDetails {
    /// Review ID
    pub id: Uuid,

    /// Reviewed job
    pub job_id: Uuid,

    /// Reviewed helper
    pub helper_id: Uuid,

    /// Helper display name
    pub helper_name: String,

    /// Family display name
    pub family_name: String,

    /// Job title
    pub job_title: String,

    /// Star rating
    pub rating: i32,

    /// Optional comment
    pub comment: Option<String>,

    /// When the review was written
    pub created_at: DateTime<Utc>,
}

/// A paid job still awaiting its review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingReview {
    /// Job awaiting review
    pub job_id: Uuid,

    /// Job title
    pub job_title: String,

    /// Helper who worked the job
    pub helper_id: Uuid,

    /// Helper display name
    pub helper_name: String,

    /// When the job was paid
    pub paid_at: DateTime<Utc>,
}

/// Aggregate rating for a helper
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RatingSummary {
    /// Mean rating across all reviews (None with no reviews)
    pub average_rating: Option<f64>,

    /// Total number of reviews
    pub total_reviews: i64,
}

const REVIEW_COLUMNS: &str = "id, job_id, family_id, helper_id, rating, comment, created_at";

impl Review {
    /// Creates a review after checking the job's billing preconditions
    ///
    /// # Errors
    ///
    /// - `ReviewError::JobNotFound` if the job is missing or owned by
    ///   another family
    /// - `ReviewError::NotPaid` if no paid payment exists for the job
    /// - `ReviewError::AlreadyReviewed` on a second review for the job
    pub async fn create(
        pool: &PgPool,
        family_id: Uuid,
        data: CreateReview,
    ) -> Result<Self, ReviewError> {
        let job: Option<(Uuid, Option<Uuid>)> =
            sqlx::query_as("SELECT id, assigned_helper_id FROM jobs WHERE id = $1 AND family_id = $2")
                .bind(data.job_id)
                .bind(family_id)
                .fetch_optional(pool)
                .await?;

        let (job_id, assigned_helper) = job.ok_or(ReviewError::JobNotFound)?;

        // The helper to credit comes from the latest paid payment; a job
        // that was assigned but never billed is not reviewable yet.
        let paid_helper: Option<(Uuid,)> = sqlx::query_as(
            "SELECT helper_id FROM payments \
             WHERE job_id = $1 AND status IN ('paid', 'received') \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

        let helper_id = match (paid_helper, assigned_helper) {
            (Some((id,)), _) => id,
            (None, _) => return Err(ReviewError::NotPaid),
        };

        let query = format!(
            r#"
            INSERT INTO reviews (job_id, family_id, helper_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (job_id) DO NOTHING
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Review>(&query)
            .bind(job_id)
            .bind(family_id)
            .bind(helper_id)
            .bind(data.rating)
            .bind(data.comment)
            .fetch_optional(pool)
            .await?
            .ok_or(ReviewError::AlreadyReviewed)
    }

    /// Lists reviews written by a family, newest first
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<ReviewWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, ReviewWithDetails>(
            r#"
            SELECT r.id, r.job_id, r.helper_id,
                   u.name AS helper_name, f.name AS family_name,
                   j.title AS job_title,
                   r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.helper_id
            JOIN users f ON f.id = r.family_id
            JOIN jobs j ON j.id = r.job_id
            WHERE r.family_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Lists reviews received by a helper, newest first
    pub async fn list_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Vec<ReviewWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, ReviewWithDetails>(
            r#"
            SELECT r.id, r.job_id, r.helper_id,
                   u.name AS helper_name, f.name AS family_name,
                   j.title AS job_title,
                   r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.helper_id
            JOIN users f ON f.id = r.family_id
            JOIN jobs j ON j.id = r.job_id
            WHERE r.helper_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(helper_id)
        .fetch_all(pool)
        .await
    }

    /// Lists a family's paid jobs that have no review yet
    pub async fn pending_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<PendingReview>, sqlx::Error> {
        sqlx::query_as::<_, PendingReview>(
            r#"
            SELECT DISTINCT ON (p.job_id)
                   p.job_id, j.title AS job_title,
                   p.helper_id, u.name AS helper_name,
                   p.created_at AS paid_at
            FROM payments p
            JOIN jobs j ON j.id = p.job_id
            JOIN users u ON u.id = p.helper_id
            WHERE p.family_id = $1
              AND p.status IN ('paid', 'received')
              AND NOT EXISTS (SELECT 1 FROM reviews r WHERE r.job_id = p.job_id)
            ORDER BY p.job_id, p.created_at DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Computes a helper's aggregate rating
    pub async fn rating_summary(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<RatingSummary, sqlx::Error> {
        sqlx::query_as::<_, RatingSummary>(
            "SELECT AVG(rating)::DOUBLE PRECISION AS average_rating, \
                    COUNT(*) AS total_reviews \
             FROM reviews WHERE helper_id = $1",
        )
        .bind(helper_id)
        .fetch_one(pool)
        .await
    }

    /// Counts reviews per star value for a helper, 1 through 5
    pub async fn rating_breakdown(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<[i64; 5], sqlx::Error> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT rating, COUNT(*) FROM reviews \
             WHERE helper_id = $1 GROUP BY rating",
        )
        .bind(helper_id)
        .fetch_all(pool)
        .await?;

        let mut breakdown = [0i64; 5];
        for (rating, count) in rows {
            if (1..=5).contains(&rating) {
                breakdown[(rating - 1) as usize] = count;
            }
        }

        Ok(breakdown)
    }
}
