/// Application model and database operations
///
/// A helper's request to work a job. Unique per (job, helper) pair.
///
/// # State Machine
///
/// ```text
/// pending → accepted
///         → rejected
/// ```
///
/// Accepting one application for a job auto-rejects every other pending
/// application for that job and assigns the job to the accepted helper.
/// All three writes happen in a single transaction so assignment stays
/// exclusive.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    /// Awaiting a family decision
    Pending,

    /// Chosen by the family; the job is assigned to this helper
    Accepted,

    /// Declined, either directly or by another application's acceptance
    Rejected,
}

/// Application model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    /// Unique application ID
    pub id: Uuid,

    /// Job applied to
    pub job_id: Uuid,

    /// Applying helper
    pub helper_id: Uuid,

    /// Contact phone supplied with the application
    pub phone: String,

    /// Contact address supplied with the application
    pub address: String,

    /// Optional message to the family
    pub message: Option<String>,

    /// Lifecycle status
    pub status: ApplicationStatus,

    /// When the application was submitted
    pub created_at: DateTime<Utc>,

    /// When the family decided (accept or reject)
    pub decided_at: Option<DateTime<Utc>>,
}

/// Input for creating a new application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    /// Job applied to
    pub job_id: Uuid,

    /// Applying helper
    pub helper_id: Uuid,

    /// Contact phone
    pub phone: String,

    /// Contact address
    pub address: String,

    /// Optional message to the family
    pub message: Option<String>,
}

/// Application joined with helper and job display fields
///
/// Shape served to families reviewing applications for their jobs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationWithDetails {
    /// Application ID
    pub id: Uuid,

    /// Job applied to
    pub job_id: Uuid,

    /// Applying helper
    pub helper_id: Uuid,

    /// Helper display name
    pub helper_name: String,

    /// Helper email
    pub helper_email: String,

    /// Contact phone
    pub phone: String,

    /// Contact address
    pub address: String,

    /// Optional message
    pub message: Option<String>,

    /// Job title
    pub job_title: String,

    /// Lifecycle status
    pub status: ApplicationStatus,

    /// When submitted
    pub created_at: DateTime<Utc>,
}

const APPLICATION_COLUMNS: &str =
    "id, job_id, helper_id, phone, address, message, status, created_at, decided_at";

impl Application {
    /// Submits an application, idempotently per (job, helper)
    ///
    /// Returns `None` when the helper already applied to this job (the
    /// unique pair conflicts and nothing is inserted).
    pub async fn create(
        pool: &PgPool,
        data: CreateApplication,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO applications (job_id, helper_id, phone, address, message)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (job_id, helper_id) DO NOTHING
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Application>(&query)
            .bind(data.job_id)
            .bind(data.helper_id)
            .bind(data.phone)
            .bind(data.address)
            .bind(data.message)
            .fetch_optional(pool)
            .await
    }

    /// Finds an application by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");

        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists job ids the helper has applied to
    pub async fn list_job_ids_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT job_id FROM applications WHERE helper_id = $1")
                .bind(helper_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Lists applications for all of a family's jobs, newest first
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<ApplicationWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationWithDetails>(
            r#"
            SELECT a.id, a.job_id, a.helper_id,
                   u.name AS helper_name, u.email AS helper_email,
                   a.phone, a.address, a.message,
                   j.title AS job_title,
                   a.status, a.created_at
            FROM applications a
            JOIN users u ON u.id = a.helper_id
            JOIN jobs j ON j.id = a.job_id
            WHERE j.family_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Accepts an application and assigns its job
    ///
    /// Within one transaction:
    /// 1. marks this application `accepted`,
    /// 2. auto-rejects every other pending application for the same job,
    /// 3. assigns the job to the accepted helper and sets it `assigned`.
    ///
    /// Returns the accepted application and the applications that were
    /// auto-rejected (so callers can send decision notifications).
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::RowNotFound` if the application is not
    /// pending or does not exist.
    pub async fn accept(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<(Self, Vec<Self>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let accept_query = format!(
            r#"
            UPDATE applications
            SET status = 'accepted', decided_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let accepted = sqlx::query_as::<_, Application>(&accept_query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        let reject_query = format!(
            r#"
            UPDATE applications
            SET status = 'rejected', decided_at = NOW()
            WHERE job_id = $1 AND id <> $2 AND status = 'pending'
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        let rejected = sqlx::query_as::<_, Application>(&reject_query)
            .bind(accepted.job_id)
            .bind(accepted.id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE jobs SET assigned_helper_id = $1, status = 'assigned' WHERE id = $2",
        )
        .bind(accepted.helper_id)
        .bind(accepted.job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((accepted, rejected))
    }

    /// Rejects a pending application
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error::RowNotFound` if the application is not
    /// pending or does not exist.
    pub async fn reject(pool: &PgPool, id: Uuid) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE applications
            SET status = 'rejected', decided_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {APPLICATION_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Rejected).unwrap(),
            "\"rejected\""
        );
    }
}
