/// Payment model and the payment materializer
///
/// A payment is a billing record computed from a helper's attendance:
/// total worked seconds reduced from check-in/check-out pairs, converted
/// to hours, multiplied by the job's hourly rate.
///
/// # State Machine
///
/// ```text
/// pending → paid → received
/// ```
///
/// `pending` exists only for rows seeded outside reconciliation (the
/// legacy confirm path flips them to `paid`); the materializer always
/// inserts directly at `paid`. `received` is set once, by the helper,
/// and only from `paid`.
///
/// # The exclusivity invariant
///
/// No attendance event may ever be counted toward more than one payment.
/// [`Payment::create_from_attendance`] therefore runs selection, payment
/// insertion, and event tagging inside a single serializable transaction
/// with the selected rows locked, retrying on serialization conflict.
/// Two concurrent reconciliations for the same helper/job either bill
/// disjoint events or one of them finds nothing to bill.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::billing::{billable_amount, round_hours, work_seconds};

/// Attempts before giving up on serialization conflicts
const MATERIALIZE_RETRIES: u32 = 3;

/// Error type for billing operations
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// No unbilled attendance matched the helper/job query
    #[error("No unpaid attendance for this helper/job")]
    NothingToBill,

    /// No job id was supplied and none could be resolved via assignment
    #[error("A job id is required, or the helper must be assigned to one of your jobs")]
    NoJobContext,

    /// The referenced payment does not exist
    #[error("Payment not found")]
    NotFound,

    /// The payment is not in a status that allows the transition
    #[error("Payment is {actual}, expected {expected}")]
    InvalidStatus {
        /// Current persisted status
        actual: PaymentStatus,

        /// Status the transition requires
        expected: PaymentStatus,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Seeded outside reconciliation, awaiting the legacy confirm path
    Pending,

    /// Billed by the family
    Paid,

    /// Receipt confirmed by the helper
    Received,
}

impl PaymentStatus {
    /// Converts status to string for display and logging
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Received => "received",
        }
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        matches!(
            (self, target),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Paid, PaymentStatus::Received)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    /// Unique payment ID
    pub id: Uuid,

    /// Paying family
    pub family_id: Uuid,

    /// Helper being paid
    pub helper_id: Uuid,

    /// Job the work belongs to (None only for legacy seeded rows)
    pub job_id: Option<Uuid>,

    /// Billed hours (2 decimals)
    pub hours_worked: f64,

    /// Hourly rate at billing time, smallest currency unit
    pub rate: i64,

    /// Billed amount, smallest currency unit
    pub amount: i64,

    /// Lifecycle status
    pub status: PaymentStatus,

    /// When the payment was created (or confirmed, on the legacy path)
    pub created_at: DateTime<Utc>,

    /// When the helper confirmed receipt
    pub received_at: Option<DateTime<Utc>>,
}

/// Payment joined with display fields for dashboards
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentWithDetails {
    /// Payment ID
    pub id: Uuid,

    /// Paying family
    pub family_id: Uuid,

    /// Helper being paid
    pub helper_id: Uuid,

    /// Job the work belongs to
    pub job_id: Option<Uuid>,

    /// Helper display name
    pub helper_name: Option<String>,

    /// Family display name
    pub family_name: Option<String>,

    /// Job title
    pub job_title: Option<String>,

    /// Job scheduled date
    pub job_date: Option<String>,

    /// Billed hours
    pub hours_worked: f64,

    /// Hourly rate
    pub rate: i64,

    /// Billed amount
    pub amount: i64,

    /// Lifecycle status
    pub status: PaymentStatus,

    /// When the payment was created
    pub created_at: DateTime<Utc>,

    /// When the helper confirmed receipt
    pub received_at: Option<DateTime<Utc>>,
}

const PAYMENT_COLUMNS: &str = "id, family_id, helper_id, job_id, hours_worked, rate, amount, \
                               status, created_at, received_at";

impl Payment {
    /// Finds a payment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Materializes a payment from the helper's unbilled attendance
    ///
    /// The caller resolves the job context first (explicit job id owned
    /// by the family, or the family's job assigned to the helper) and
    /// passes the job's hourly rate.
    ///
    /// Inside one serializable transaction: select the unbilled events
    /// (locked), reduce them to seconds, insert the payment at `paid`,
    /// and tag every consumed event with the new payment's id. Retries
    /// up to three times on serialization conflict (SQLSTATE 40001).
    ///
    /// # Errors
    ///
    /// - `BillingError::NothingToBill` if no unbilled events qualify
    /// - `BillingError::Database` for any persistent database failure
    pub async fn create_from_attendance(
        pool: &PgPool,
        family_id: Uuid,
        helper_id: Uuid,
        job_id: Uuid,
        rate: i64,
    ) -> Result<Self, BillingError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::try_materialize(pool, family_id, helper_id, job_id, rate).await {
                Err(BillingError::Database(e)) if is_serialization_conflict(&e) => {
                    if attempt >= MATERIALIZE_RETRIES {
                        return Err(BillingError::Database(e));
                    }
                    warn!(
                        helper_id = %helper_id,
                        job_id = %job_id,
                        attempt,
                        "Serialization conflict during payment materialization, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    /// One materialization attempt; see `create_from_attendance`
    async fn try_materialize(
        pool: &PgPool,
        family_id: Uuid,
        helper_id: Uuid,
        job_id: Uuid,
        rate: i64,
    ) -> Result<Self, BillingError> {
        let mut tx = pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        // The unbilled-attendance selector, with the rows locked so a
        // concurrent reconciliation cannot consume them too. Legacy
        // null-job events fold into whichever job bills first.
        let events: Vec<(Uuid, crate::models::attendance::AttendanceAction, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT id, action, created_at
                FROM attendance
                WHERE helper_id = $1 AND (job_id = $2 OR job_id IS NULL)
                  AND payment_id IS NULL
                ORDER BY created_at ASC
                FOR UPDATE
                "#,
            )
            .bind(helper_id)
            .bind(job_id)
            .fetch_all(&mut *tx)
            .await?;

        if events.is_empty() {
            return Err(BillingError::NothingToBill);
        }

        let seconds = work_seconds(
            events.iter().map(|(_, action, at)| (*action, *at)),
            Utc::now(),
        );
        let hours = round_hours(seconds);
        let amount = billable_amount(hours, rate);

        let insert_query = format!(
            r#"
            INSERT INTO payments (family_id, helper_id, job_id, hours_worked, rate, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'paid')
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let payment = sqlx::query_as::<_, Payment>(&insert_query)
            .bind(family_id)
            .bind(helper_id)
            .bind(job_id)
            .bind(hours)
            .bind(rate)
            .bind(amount)
            .fetch_one(&mut *tx)
            .await?;

        let event_ids: Vec<Uuid> = events.iter().map(|(id, _, _)| *id).collect();
        sqlx::query("UPDATE attendance SET payment_id = $1 WHERE id = ANY($2)")
            .bind(payment.id)
            .bind(&event_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(payment)
    }

    /// Legacy confirm path: flips an existing payment to `paid`
    ///
    /// Used for payment rows seeded outside the reconciliation path.
    /// Attendance is untouched. The creation timestamp is reset to the
    /// confirmation time, matching the historical behavior.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::NotFound` if no payment with this id
    /// belongs to the family
    pub async fn confirm_pending(
        pool: &PgPool,
        id: Uuid,
        family_id: Uuid,
    ) -> Result<Self, BillingError> {
        let query = format!(
            r#"
            UPDATE payments
            SET status = 'paid', created_at = NOW()
            WHERE id = $1 AND family_id = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(family_id)
            .fetch_optional(pool)
            .await?
            .ok_or(BillingError::NotFound)
    }

    /// Marks a `paid` payment as received by its helper
    ///
    /// One-way transition; rejected unless the current status is `paid`.
    ///
    /// # Errors
    ///
    /// - `BillingError::NotFound` if the payment does not exist or does
    ///   not belong to the helper
    /// - `BillingError::InvalidStatus` if the payment is not `paid`
    pub async fn mark_received(
        pool: &PgPool,
        id: Uuid,
        helper_id: Uuid,
    ) -> Result<Self, BillingError> {
        let query = format!(
            r#"
            UPDATE payments
            SET status = 'received', received_at = NOW()
            WHERE id = $1 AND helper_id = $2 AND status = 'paid'
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(helper_id)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(payment) => Ok(payment),
            None => {
                // Distinguish a missing payment from a bad status so the
                // caller can report 404 vs 400.
                let existing = sqlx::query_as::<_, Payment>(&format!(
                    "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND helper_id = $2"
                ))
                .bind(id)
                .bind(helper_id)
                .fetch_optional(pool)
                .await?;

                match existing {
                    Some(payment) => Err(BillingError::InvalidStatus {
                        actual: payment.status,
                        expected: PaymentStatus::Paid,
                    }),
                    None => Err(BillingError::NotFound),
                }
            }
        }
    }

    /// Lists a family's payments with display fields, newest first
    pub async fn list_for_family(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<PaymentWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, PaymentWithDetails>(
            r#"
            SELECT p.id, p.family_id, p.helper_id, p.job_id,
                   u.name AS helper_name, f.name AS family_name,
                   j.title AS job_title, j.date AS job_date,
                   p.hours_worked, p.rate, p.amount, p.status,
                   p.created_at, p.received_at
            FROM payments p
            LEFT JOIN users u ON u.id = p.helper_id
            LEFT JOIN users f ON f.id = p.family_id
            LEFT JOIN jobs j ON j.id = p.job_id
            WHERE p.family_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    /// Lists a helper's payments with display fields, newest first
    pub async fn list_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Vec<PaymentWithDetails>, sqlx::Error> {
        sqlx::query_as::<_, PaymentWithDetails>(
            r#"
            SELECT p.id, p.family_id, p.helper_id, p.job_id,
                   u.name AS helper_name, f.name AS family_name,
                   j.title AS job_title, j.date AS job_date,
                   p.hours_worked, p.rate, p.amount, p.status,
                   p.created_at, p.received_at
            FROM payments p
            LEFT JOIN users u ON u.id = p.helper_id
            LEFT JOIN users f ON f.id = p.family_id
            LEFT JOIN jobs j ON j.id = p.job_id
            WHERE p.helper_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(helper_id)
        .fetch_all(pool)
        .await
    }
}

/// Checks whether a database error is a Postgres serialization conflict
fn is_serialization_conflict(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "40001")
        .unwrap_or(false)
}
