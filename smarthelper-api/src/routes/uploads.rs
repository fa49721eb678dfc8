/// Image upload relay
///
/// Images (avatars, post photos) are hosted on an external image service;
/// the API only relays the upload so the unsigned preset and endpoint stay
/// server-side. The client sends a base64 data URL, the relay returns the
/// hosted URL to store on the profile or post.
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use smarthelper_shared::auth::middleware::AuthContext;
use serde::Deserialize;
use serde_json::{json, Value};

/// Upload request
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Base64 data URL of the image
    pub image: String,
}

/// Response shape returned by the external image host
#[derive(Debug, Deserialize)]
struct HostedImage {
    secure_url: String,
}

/// Relays an image upload to the external host
///
/// # Errors
///
/// - `503 Service Unavailable`: No upload endpoint configured
/// - `400 Bad Request`: Empty image payload or host rejected the upload
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthContext>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<Json<Value>> {
    if req.image.trim().is_empty() {
        return Err(ApiError::BadRequest("Image payload is empty".to_string()));
    }

    let upload_url = state.config.uploads.url.as_deref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Image uploads are not configured".to_string())
    })?;
    let preset = state.config.uploads.preset.clone().unwrap_or_default();

    let form = [("file", req.image), ("upload_preset", preset)];

    let response = state
        .http
        .post(upload_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Image host unreachable: {}", e)))?;

    if !response.status().is_success() {
        return Err(ApiError::BadRequest(
            "Image host rejected the upload".to_string(),
        ));
    }

    let hosted: HostedImage = response
        .json()
        .await
        .map_err(|e| ApiError::InternalError(format!("Unexpected image host response: {}", e)))?;

    Ok(Json(json!({ "url": hosted.secure_url })))
}
