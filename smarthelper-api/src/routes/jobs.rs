/// Job posting endpoints
///
/// # Endpoints
///
/// - `POST /v1/jobs` - Post a job (family only)
/// - `GET /v1/jobs` - List jobs (role-dependent view)
/// - `GET /v1/jobs/:id` - Fetch one job
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use smarthelper_shared::models::{
    job::{CreateJob, Job},
    user::UserRole,
};
use smarthelper_shared::auth::middleware::AuthContext;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create job request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    /// Job title
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
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
    #[serde(default)]
    pub pay_per_hour: i64,

    /// Job category
    pub category: Option<String>,
}

/// Posts a new job (family only)
pub async fn create_job(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<Json<Job>> {
    auth.require_family()?;

    req.validate().map_err(|e| {
        let errors: Vec<ValidationErrorDetail> = e
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        ApiError::ValidationError(errors)
    })?;

    if req.pay_per_hour < 0 {
        return Err(ApiError::BadRequest(
            "Hourly rate cannot be negative".to_string(),
        ));
    }

    let job = Job::create(
        &state.db,
        CreateJob {
            family_id: auth.user_id,
            title: req.title,
            description: req.description,
            location: req.location,
            date: req.date,
            time: req.time,
            duration: req.duration,
            pay_per_hour: req.pay_per_hour,
            category: req.category,
        },
    )
    .await?;

    Ok(Json(job))
}

/// Lists jobs
///
/// Helpers see open jobs only; families see every job (their dashboard
/// filters client-side).
pub async fn list_jobs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Job>>> {
    let jobs = match auth.role {
        UserRole::Helper => Job::list_open(&state.db).await?,
        UserRole::Family => Job::list_all(&state.db).await?,
    };

    Ok(Json(jobs))
}

/// Fetches one job by id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    let job = Job::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    Ok(Json(job))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_per_hour_defaults_to_zero() {
        let json = r#"{"title":"Cleaning"}"#;
        let req: CreateJobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.pay_per_hour, 0);
    }

    #[test]
    fn test_title_required() {
        let req = CreateJobRequest {
            title: String::new(),
            description: None,
            location: None,
            date: None,
            time: None,
            duration: None,
            pay_per_hour: 200,
            category: None,
        };
        assert!(req.validate().is_err());
    }
}
