/// Billing and payment endpoints
///
/// `POST /v1/payments` takes a tagged request: `confirm` flips a legacy
/// seeded payment to paid, `from_attendance` runs the reconciliation that
/// turns a helper's unbilled attendance into a payment. Dashboards read
/// `GET .../family` and `GET .../helper`, which pair computed pending
/// summaries with the persisted payment rows.
///
/// # Endpoints
///
/// - `POST /v1/payments` - Confirm or reconcile (family only)
/// - `GET /v1/payments/family` - Family billing dashboard
/// - `GET /v1/payments/helper` - Helper earnings dashboard
/// - `POST /v1/payments/:id/receive` - Confirm receipt (helper only)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use smarthelper_shared::{
    auth::middleware::AuthContext,
    billing::{summarize_pending, PendingBillingSummary},
    models::{
        attendance::AttendanceEvent,
        job::Job,
        payment::{BillingError, Payment, PaymentWithDetails},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment creation request, tagged by intent
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreatePaymentRequest {
    /// Legacy path: confirm a seeded pending payment
    Confirm {
        /// Payment to confirm
        payment_id: Uuid,
    },

    /// Reconcile a helper's unbilled attendance into a new payment
    FromAttendance {
        /// Helper to bill for
        helper_id: Uuid,

        /// Job context; omitted falls back to the family's job assigned
        /// to this helper
        job_id: Option<Uuid>,
    },
}

/// Dashboard response: computed pending summaries plus persisted payments
#[derive(Debug, Serialize)]
pub struct PaymentDashboard {
    /// Unbilled attendance grouped per (helper, job), priced as of now
    pub pending: Vec<PendingBillingSummary>,

    /// Persisted payment rows, newest first
    pub paid: Vec<PaymentWithDetails>,
}

/// Creates a payment (family only)
///
/// # Errors
///
/// - `404 Not Found`: Unknown payment (`confirm`) or a job id that does
///   not belong to the family (`from_attendance`)
/// - `400 Bad Request`: Nothing to bill, or no job id was given and the
///   helper is not assigned to one of the family's jobs
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<Json<Payment>> {
    auth.require_family()?;

    let payment = match req {
        CreatePaymentRequest::Confirm { payment_id } => {
            Payment::confirm_pending(&state.db, payment_id, auth.user_id).await?
        }
        CreatePaymentRequest::FromAttendance { helper_id, job_id } => {
            let job = resolve_job(&state, auth.user_id, helper_id, job_id).await?;
            Payment::create_from_attendance(
                &state.db,
                auth.user_id,
                helper_id,
                job.id,
                job.pay_per_hour,
            )
            .await?
        }
    };

    Ok(Json(payment))
}

/// Resolves the job a reconciliation bills against
///
/// An explicit job id must belong to the calling family (404 otherwise);
/// without one, the family's job assigned to the helper is used.
async fn resolve_job(
    state: &AppState,
    family_id: Uuid,
    helper_id: Uuid,
    job_id: Option<Uuid>,
) -> ApiResult<Job> {
    match job_id {
        Some(id) => Job::find_for_family(&state.db, id, family_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Job not found for this family".to_string())),
        None => Job::find_assigned(&state.db, helper_id, family_id)
            .await?
            .ok_or_else(|| ApiError::from(BillingError::NoJobContext)),
    }
}

/// Family billing dashboard
pub async fn list_for_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PaymentDashboard>> {
    auth.require_family()?;

    let unbilled = AttendanceEvent::find_unbilled_for_family(&state.db, auth.user_id).await?;
    let pending = summarize_pending(&unbilled, Utc::now());
    let paid = Payment::list_for_family(&state.db, auth.user_id).await?;

    Ok(Json(PaymentDashboard { pending, paid }))
}

/// Helper earnings dashboard
pub async fn list_for_helper(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<PaymentDashboard>> {
    auth.require_helper()?;

    let unbilled = AttendanceEvent::find_unbilled_for_helper(&state.db, auth.user_id).await?;
    let pending = summarize_pending(&unbilled, Utc::now());
    let paid = Payment::list_for_helper(&state.db, auth.user_id).await?;

    Ok(Json(PaymentDashboard { pending, paid }))
}

/// Confirms receipt of a paid payment (helper only, one-way)
pub async fn mark_received(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Payment>> {
    auth.require_helper()?;

    let payment = Payment::mark_received(&state.db, id, auth.user_id).await?;

    Ok(Json(payment))
}
