/// Job application endpoints
///
/// # Endpoints
///
/// - `POST /v1/applications` - Apply to a job (helper only)
/// - `GET /v1/applications/helper` - Job ids the helper applied to
/// - `GET /v1/applications/family` - Applications for the family's jobs
/// - `POST /v1/applications/:id/accept` - Accept (family only)
/// - `POST /v1/applications/:id/reject` - Reject (family only)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use smarthelper_shared::{
    auth::middleware::AuthContext,
    models::{
        application::{Application, ApplicationWithDetails, CreateApplication},
        job::{Job, JobStatus},
        user::User,
    },
    notify::ApplicationDecisionNotice,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Apply request
#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Job to apply to
    pub job_id: Uuid,

    /// Contact phone
    pub phone: String,

    /// Contact address
    pub address: String,

    /// Optional message to the family
    pub message: Option<String>,
}

/// Submits an application to an open job (helper only)
///
/// Idempotent per (job, helper): a second application to the same job
/// returns 409.
pub async fn apply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ApplyRequest>,
) -> ApiResult<Json<Application>> {
    auth.require_helper()?;

    let job = Job::find_by_id(&state.db, req.job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    if job.status != JobStatus::Open {
        return Err(ApiError::BadRequest(
            "Job is no longer accepting applications".to_string(),
        ));
    }

    let application = Application::create(
        &state.db,
        CreateApplication {
            job_id: req.job_id,
            helper_id: auth.user_id,
            phone: req.phone,
            address: req.address,
            message: req.message,
        },
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Already applied to this job".to_string()))?;

    Ok(Json(application))
}

/// Lists the job ids the helper has applied to
pub async fn list_for_helper(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Uuid>>> {
    auth.require_helper()?;

    let job_ids = Application::list_job_ids_for_helper(&state.db, auth.user_id).await?;

    Ok(Json(job_ids))
}

/// Lists applications across all the family's jobs
pub async fn list_for_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ApplicationWithDetails>>> {
    auth.require_family()?;

    let applications = Application::list_for_family(&state.db, auth.user_id).await?;

    Ok(Json(applications))
}

/// Loads an application together with its job, enforcing family ownership
async fn load_owned(
    state: &AppState,
    application_id: Uuid,
    family_id: Uuid,
) -> ApiResult<(Application, Job)> {
    let application = Application::find_by_id(&state.db, application_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

    let job = Job::find_for_family(&state.db, application.job_id, family_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Not your job".to_string()))?;

    Ok((application, job))
}

/// Accepts an application (family only)
///
/// Assigns the job to the helper, auto-rejects every other pending
/// application for it, and queues decision emails for everyone affected.
///
/// # Errors
///
/// - `404 Not Found`: Unknown application, or it is no longer pending
/// - `403 Forbidden`: The application's job belongs to another family
pub async fn accept(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    auth.require_family()?;

    let (_, job) = load_owned(&state, id, auth.user_id).await?;

    let (accepted, auto_rejected) = Application::accept(&state.db, id).await?;

    let family_name = User::find_by_id(&state.db, auth.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();

    if let Some(helper) = User::find_by_id(&state.db, accepted.helper_id).await? {
        state
            .notifier
            .send_application_decision(ApplicationDecisionNotice::accepted(
                helper.email,
                helper.name,
                family_name.clone(),
                job.title.clone(),
                job.location.clone(),
                job.date.clone(),
                job.time.clone(),
                job.pay_per_hour,
            ));
    }

    for rejected in &auto_rejected {
        if let Some(helper) = User::find_by_id(&state.db, rejected.helper_id).await? {
            state
                .notifier
                .send_application_decision(ApplicationDecisionNotice::rejected(
                    helper.email,
                    helper.name,
                    family_name.clone(),
                    job.title.clone(),
                ));
        }
    }

    Ok(Json(json!({
        "accepted": accepted,
        "auto_rejected": auto_rejected.len(),
    })))
}

/// Rejects a pending application (family only)
pub async fn reject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Application>> {
    auth.require_family()?;

    let (_, job) = load_owned(&state, id, auth.user_id).await?;

    let rejected = Application::reject(&state.db, id).await?;

    let family_name = User::find_by_id(&state.db, auth.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();

    if let Some(helper) = User::find_by_id(&state.db, rejected.helper_id).await? {
        state
            .notifier
            .send_application_decision(ApplicationDecisionNotice::rejected(
                helper.email,
                helper.name,
                family_name,
                job.title,
            ));
    }

    Ok(Json(rejected))
}
