/// Attendance event model and database operations
///
/// An attendance event is an immutable fact: one check-in or check-out,
/// timestamped and geolocated, for a helper and a job. The only mutation
/// ever applied is payment tagging — once a payment consumes an event,
/// `payment_id` is set (exactly once, by the payment materializer) and the
/// event is excluded from every future reconciliation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attendance (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     helper_id UUID NOT NULL REFERENCES users(id),
///     job_id UUID REFERENCES jobs(id),
///     family_id UUID REFERENCES users(id),
///     action attendance_action NOT NULL,
///     lat DOUBLE PRECISION,
///     lon DOUBLE PRECISION,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     payment_id UUID REFERENCES payments(id)
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Attendance event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_action")]
pub enum AttendanceAction {
    /// Start of a work interval
    #[sqlx(rename = "check-in")]
    #[serde(rename = "check-in")]
    CheckIn,

    /// End of a work interval
    #[sqlx(rename = "check-out")]
    #[serde(rename = "check-out")]
    CheckOut,
}

/// Attendance event model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Helper who scanned
    pub helper_id: Uuid,

    /// Job the event is attributed to (None only for legacy rows)
    pub job_id: Option<Uuid>,

    /// Family the event is attributed to, via the job
    pub family_id: Option<Uuid>,

    /// Check-in or check-out
    pub action: AttendanceAction,

    /// Latitude at scan time
    pub lat: Option<f64>,

    /// Longitude at scan time
    pub lon: Option<f64>,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,

    /// Payment that consumed this event, if billed
    pub payment_id: Option<Uuid>,
}

/// Input for recording a new attendance event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAttendance {
    /// Helper who scanned
    pub helper_id: Uuid,

    /// Job the event belongs to
    pub job_id: Uuid,

    /// Family attributed from the job
    pub family_id: Option<Uuid>,

    /// Check-in or check-out
    pub action: AttendanceAction,

    /// Latitude at scan time
    pub lat: Option<f64>,

    /// Longitude at scan time
    pub lon: Option<f64>,
}

/// Attendance event joined with helper display fields
///
/// Shape served to families reviewing their helpers' attendance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceWithHelper {
    /// Event ID
    pub id: Uuid,

    /// Helper who scanned
    pub helper_id: Uuid,

    /// Helper display name
    pub helper_name: String,

    /// Helper email
    pub helper_email: String,

    /// Job the event belongs to
    pub job_id: Option<Uuid>,

    /// Check-in or check-out
    pub action: AttendanceAction,

    /// Latitude at scan time
    pub lat: Option<f64>,

    /// Longitude at scan time
    pub lon: Option<f64>,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,

    /// Payment that consumed this event, if billed
    pub payment_id: Option<Uuid>,
}

/// Unbilled event row with the display and rate fields needed to build a
/// pending billing summary group
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnbilledEventRow {
    /// Helper who scanned
    pub helper_id: Uuid,

    /// Job the event belongs to (None for legacy rows; its own group)
    pub job_id: Option<Uuid>,

    /// Check-in or check-out
    pub action: AttendanceAction,

    /// When the event was recorded
    pub created_at: DateTime<Utc>,

    /// Helper display name
    pub helper_name: String,

    /// Job title, when a job is attached
    pub job_title: Option<String>,

    /// Job scheduled date, when a job is attached
    pub job_date: Option<String>,

    /// Hourly rate from the job (None for legacy job-less rows)
    pub pay_per_hour: Option<i64>,
}

const ATTENDANCE_COLUMNS: &str =
    "id, helper_id, job_id, family_id, action, lat, lon, created_at, payment_id";

impl AttendanceEvent {
    /// Records a new attendance event
    pub async fn record(pool: &PgPool, data: RecordAttendance) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO attendance (helper_id, job_id, family_id, action, lat, lon)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ATTENDANCE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, AttendanceEvent>(&query)
            .bind(data.helper_id)
            .bind(data.job_id)
            .bind(data.family_id)
            .bind(data.action)
            .bind(data.lat)
            .bind(data.lon)
            .fetch_one(pool)
            .await
    }

    /// Lists a helper's own events, newest first
    pub async fn list_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE helper_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, AttendanceEvent>(&query)
            .bind(helper_id)
            .fetch_all(pool)
            .await
    }

    /// Lists events visible to a family, newest first
    ///
    /// Covers events attributed to the family directly, plus legacy
    /// unattributed events of helpers assigned to the family's jobs.
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<AttendanceWithHelper>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceWithHelper>(
            r#"
            SELECT a.id, a.helper_id, u.name AS helper_name, u.email AS helper_email,
                   a.job_id, a.action, a.lat, a.lon, a.created_at, a.payment_id
            FROM attendance a
            JOIN users u ON u.id = a.helper_id
            WHERE a.family_id = $1
               OR (a.family_id IS NULL
                   AND a.helper_id IN
                       (SELECT assigned_helper_id FROM jobs WHERE family_id = $1))
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Unbilled events across all of a family's helpers, with the display
    /// fields needed for pending billing summaries
    ///
    /// Ordered by (helper, job, created_at) so the caller can group rows
    /// by (helper, job) and feed each group to the reducer in ascending
    /// time order.
    pub async fn find_unbilled_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<UnbilledEventRow>, sqlx::Error> {
        sqlx::query_as::<_, UnbilledEventRow>(
            r#"
            SELECT a.helper_id, a.job_id, a.action, a.created_at,
                   u.name AS helper_name, j.title AS job_title,
                   j.date AS job_date, j.pay_per_hour
            FROM attendance a
            JOIN users u ON u.id = a.helper_id
            LEFT JOIN jobs j ON j.id = a.job_id
            WHERE a.family_id = $1 AND a.payment_id IS NULL
            ORDER BY a.helper_id, a.job_id, a.created_at ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Unbilled events for one helper across all families, same shape as
    /// the family variant
    pub async fn find_unbilled_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Vec<UnbilledEventRow>, sqlx::Error> {
        sqlx::query_as::<_, UnbilledEventRow>(
            r#"
            SELECT a.helper_id, a.job_id, a.action, a.created_at,
                   u.name AS helper_name, j.title AS job_title,
                   j.date AS job_date, j.pay_per_hour
            FROM attendance a
            JOIN users u ON u.id = a.helper_id
            LEFT JOIN jobs j ON j.id = a.job_id
            WHERE a.helper_id = $1 AND a.payment_id IS NULL
            ORDER BY a.helper_id, a.job_id, a.created_at ASC
            "#,
        )
        .bind(helper_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serialization() {
        assert_eq!(
            serde_json::to_string(&AttendanceAction::CheckIn).unwrap(),
            "\"check-in\""
        );
        assert_eq!(
            serde_json::to_string(&AttendanceAction::CheckOut).unwrap(),
            "\"check-out\""
        );
        assert_eq!(
            serde_json::from_str::<AttendanceAction>("\"check-out\"").unwrap(),
            AttendanceAction::CheckOut
        );
    }
}
