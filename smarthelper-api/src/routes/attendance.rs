/// Face gate and attendance scan endpoints
///
/// A helper must register a face template before any scan is accepted;
/// the template itself is opaque to the server. Each scan must carry the
/// captured image (the client verifies the face before uploading) and the
/// job it belongs to, so every new event is attributable at billing time.
///
/// # Endpoints
///
/// - `GET /v1/attendance/face` - Face registration status (helper only)
/// - `POST /v1/attendance/face` - Register face template (helper only)
/// - `POST /v1/attendance/scan` - Record a check-in/check-out (helper only)
/// - `GET /v1/attendance/helper` - Helper's own events
/// - `GET /v1/attendance/family` - Events across the family's helpers
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use smarthelper_shared::{
    auth::middleware::AuthContext,
    models::{
        attendance::{AttendanceAction, AttendanceEvent, AttendanceWithHelper, RecordAttendance},
        face::FaceTemplate,
        job::Job,
    },
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Face registration request
#[derive(Debug, Deserialize)]
pub struct RegisterFaceRequest {
    /// Opaque client-produced face template
    pub template: String,
}

/// Scan request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Job the scan belongs to
    pub job_id: Uuid,

    /// Check-in or check-out
    pub action: AttendanceAction,

    /// Captured image data URL; presence certifies the client-side match
    pub image: String,

    /// Latitude at scan time
    pub lat: Option<f64>,

    /// Longitude at scan time
    pub lon: Option<f64>,
}

/// Returns the helper's face registration status
pub async fn get_face(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Value>> {
    auth.require_helper()?;

    let face = FaceTemplate::find_for_helper(&state.db, auth.user_id).await?;

    Ok(Json(json!({
        "registered": face.is_some(),
        "registered_at": face.map(|f| f.created_at),
    })))
}

/// Registers or replaces the helper's face template
pub async fn register_face(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RegisterFaceRequest>,
) -> ApiResult<Json<Value>> {
    auth.require_helper()?;

    if req.template.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Face template cannot be empty".to_string(),
        ));
    }

    let face = FaceTemplate::upsert(&state.db, auth.user_id, &req.template).await?;

    Ok(Json(json!({
        "registered": true,
        "registered_at": face.created_at,
    })))
}

/// Records an attendance event
///
/// # Errors
///
/// - `412 Precondition Failed`: No face template registered
/// - `400 Bad Request`: Missing capture image
/// - `404 Not Found`: Unknown job
pub async fn scan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ScanRequest>,
) -> ApiResult<Json<AttendanceEvent>> {
    auth.require_helper()?;

    let face = FaceTemplate::find_for_helper(&state.db, auth.user_id).await?;
    if face.is_none() {
        return Err(ApiError::PreconditionFailed(
            "Register your face before scanning attendance".to_string(),
        ));
    }

    if req.image.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "A capture image is required to verify the scan".to_string(),
        ));
    }

    let job = Job::find_by_id(&state.db, req.job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;

    let event = AttendanceEvent::record(
        &state.db,
        RecordAttendance {
            helper_id: auth.user_id,
            job_id: job.id,
            family_id: Some(job.family_id),
            action: req.action,
            lat: req.lat,
            lon: req.lon,
        },
    )
    .await?;

    Ok(Json(event))
}

/// Lists the helper's own attendance events, newest first
pub async fn list_for_helper(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<AttendanceEvent>>> {
    auth.require_helper()?;

    let events = AttendanceEvent::list_for_helper(&state.db, auth.user_id).await?;

    Ok(Json(events))
}

/// Lists events across the family's helpers, newest first
pub async fn list_for_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<AttendanceWithHelper>>> {
    auth.require_family()?;

    let events = AttendanceEvent::list_for_family(&state.db, auth.user_id).await?;

    Ok(Json(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_request_requires_job_id() {
        // job_id is mandatory; a payload without it must not deserialize
        let json = r#"{"action":"check-in","image":"data:image/png;base64,xyz"}"#;
        assert!(serde_json::from_str::<ScanRequest>(json).is_err());
    }

    #[test]
    fn test_scan_request_deserializes() {
        let json = format!(
            r#"{{"job_id":"{}","action":"check-out","image":"data:...","lat":1.29,"lon":103.85}}"#,
            Uuid::new_v4()
        );
        let req: ScanRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.action, AttendanceAction::CheckOut);
        assert_eq!(req.lat, Some(1.29));
    }
}
