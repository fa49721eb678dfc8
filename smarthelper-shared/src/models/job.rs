/// Job model and database operations
///
/// Jobs are posted by families, applied to by helpers, and move through a
/// simple lifecycle once a helper is chosen.
///
/// # State Machine
///
/// ```text
/// open → assigned → closed
/// ```
///
/// Assignment is exclusive: a job has at most one assigned helper, and
/// assigning it rejects all other pending applications (see the
/// `application` module).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepting applications
    Open,

    /// A helper has been assigned
    Assigned,

    /// Work completed, no longer active
    Closed,
}

impl JobStatus {
    /// Converts status to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Closed => "closed",
        }
    }
}

/// Job model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    /// Unique job ID
    pub id: Uuid,

    /// Family that posted the job
    pub family_id: Uuid,

    /// Job title
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Location description
    pub location: Option<String>,

    /// Scheduled date (free-form, as entered by the family)
    pub date: Option<String>,

    /// Scheduled time (free-form)
    pub time: Option<String>,

    /// Expected duration (free-form)
    pub duration: Option<String>,

    /// Hourly rate in the smallest currency unit
    pub pay_per_hour: i64,

    /// Job category (e.g., "Housekeeping", "Childcare")
    pub category: Option<String>,

    /// Helper assigned to the job, if any
    pub assigned_helper_id: Option<Uuid>,

    /// Lifecycle status
    pub status: JobStatus,

    /// When the job was posted
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Posting family
    pub family_id: Uuid,

    /// Job title
    pub title: String,

    /// Free-text description
    pub description: Option<String>,

    /// Location description
    pub location: Option<String>,

    /// Scheduled date
    pub date: Option<String>,

    /// Scheduled time
    pub time: Option<String>,

    /// Expected duration
    pub duration: Option<String>,

    /// Hourly rate in the smallest currency unit
    pub pay_per_hour: i64,

    /// Job category
    pub category: Option<String>,
}

const JOB_COLUMNS: &str = "id, family_id, title, description, location, date, time, duration, \
                           pay_per_hour, category, assigned_helper_id, status, created_at";

impl Job {
    /// Creates a new job in `open` status
    pub async fn create(pool: &PgPool, data: CreateJob) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO jobs (family_id, title, description, location, date, time,
                              duration, pay_per_hour, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {JOB_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(data.family_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.location)
            .bind(data.date)
            .bind(data.time)
            .bind(data.duration)
            .bind(data.pay_per_hour)
            .bind(data.category)
            .fetch_one(pool)
            .await
    }

    /// Finds a job by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");

        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a job by ID only if it belongs to the given family
    ///
    /// Used as the ownership precondition for billing and reviews.
    pub async fn find_for_family(
        pool: &PgPool,
        id: Uuid,
        family_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND family_id = $2");

        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(family_id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a job assigned to the given helper under the given family
    ///
    /// Resolves the job context when a payment request omits the job id.
    pub async fn find_assigned(
        pool: &PgPool,
        helper_id: Uuid,
        family_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             WHERE assigned_helper_id = $1 AND family_id = $2 LIMIT 1"
        );

        sqlx::query_as::<_, Job>(&query)
            .bind(helper_id)
            .bind(family_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists open jobs, newest scheduled date first
    ///
    /// This is the helper-facing listing; filled jobs are not relevant.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'open' ORDER BY date DESC"
        );

        sqlx::query_as::<_, Job>(&query).fetch_all(pool).await
    }

    /// Lists all jobs (family-facing listing)
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC");

        sqlx::query_as::<_, Job>(&query).fetch_all(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&JobStatus::Open).unwrap(), "\"open\"");
        assert_eq!(
            serde_json::to_string(&JobStatus::Assigned).unwrap(),
            "\"assigned\""
        );
    }
}
