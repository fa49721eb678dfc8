/// Review endpoints
///
/// # Endpoints
///
/// - `POST /v1/reviews` - Review a paid job (family only)
/// - `GET /v1/reviews/family` - Reviews the family has written
/// - `GET /v1/reviews/family/pending` - Paid jobs still awaiting review
/// - `GET /v1/reviews/helper/:id` - Reviews a helper has received
/// - `GET /v1/reviews/helper/:id/summary` - Helper rating aggregate
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
    models::review::{CreateReview, PendingReview, Review, ReviewWithDetails},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Create review request
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Job being reviewed
    pub job_id: Uuid,

    /// Star rating, 1 through 5
    pub rating: i32,

    /// Optional free-text comment
    pub comment: Option<String>,
}

/// Creates a review for a paid job (family only)
///
/// # Errors
///
/// - `400 Bad Request`: Rating out of range, or the job has no paid
///   payment yet
/// - `409 Conflict`: The job already has a review
pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<Json<Review>> {
    auth.require_family()?;

    if !(1..=5).contains(&req.rating) {
        return Err(ApiError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let review = Review::create(
        &state.db,
        auth.user_id,
        CreateReview {
            job_id: req.job_id,
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?;

    Ok(Json(review))
}

/// Lists the reviews a family has written
pub async fn list_for_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ReviewWithDetails>>> {
    auth.require_family()?;

    let reviews = Review::list_for_family(&state.db, auth.user_id).await?;

    Ok(Json(reviews))
}

/// Lists the family's paid jobs that have no review yet
pub async fn pending_for_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PendingReview>>> {
    auth.require_family()?;

    let pending = Review::pending_for_family(&state.db, auth.user_id).await?;

    Ok(Json(pending))
}

/// Lists the reviews a helper has received (any authenticated user)
pub async fn list_for_helper(
    State(state): State<AppState>,
    Path(helper_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewWithDetails>>> {
    let reviews = Review::list_for_helper(&state.db, helper_id).await?;

    Ok(Json(reviews))
}

/// Returns a helper's aggregate rating and per-star breakdown
pub async fn rating_summary(
    State(state): State<AppState>,
    Path(helper_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let summary = Review::rating_summary(&state.db, helper_id).await?;
    let breakdown = Review::rating_breakdown(&state.db, helper_id).await?;

    Ok(Json(json!({
        "average_rating": summary.average_rating,
        "total_reviews": summary.total_reviews,
        "breakdown": breakdown,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_request_deserializes() {
        let json = format!(
            r#"{{"job_id":"{}","rating":5,"comment":"Spotless work"}}"#,
            Uuid::new_v4()
        );
        let req: CreateReviewRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.rating, 5);
        assert_eq!(req.comment.as_deref(), Some("Spotless work"));
    }
}
