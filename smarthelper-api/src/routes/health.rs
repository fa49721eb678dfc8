/// Health check endpoint
///
/// `GET /health` verifies the server is up and its database reachable.
use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Health check handler
///
/// Returns 200 with the service version when the database responds.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(&state.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
