/// Community feed endpoints
///
/// # Endpoints
///
/// - `POST /v1/posts` - Create a post
/// - `GET /v1/posts` - Global feed, annotated for the viewer
/// - `DELETE /v1/posts/:id` - Delete own post
/// - `POST /v1/posts/follow/:author_id` - Toggle following an author
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
    models::post::{CreatePost, FeedPost, Follower, Post},
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Create post request
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Post text
    pub description: String,

    /// Optional attached image URL
    pub image_url: Option<String>,
}

/// Creates a post for the authenticated user
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    if req.description.trim().is_empty() && req.image_url.is_none() {
        return Err(ApiError::BadRequest(
            "A post needs text or an image".to_string(),
        ));
    }

    let post = Post::create(
        &state.db,
        CreatePost {
            author_id: auth.user_id,
            description: req.description,
            image_url: req.image_url,
        },
    )
    .await?;

    Ok(Json(post))
}

/// Returns the global feed, newest first, annotated for the viewer
pub async fn feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<FeedPost>>> {
    let posts = Post::feed(&state.db, auth.user_id).await?;

    Ok(Json(posts))
}

/// Deletes a post; only its author may delete it
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let deleted = Post::delete(&state.db, id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    Ok(Json(json!({ "deleted": true })))
}

/// Toggles following an author; self-follows are rejected
pub async fn toggle_follow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(author_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    if author_id == auth.user_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".to_string()));
    }

    let following = Follower::toggle(&state.db, author_id, auth.user_id).await?;
    let follower_count = Follower::count(&state.db, author_id).await?;

    Ok(Json(json!({
        "following": following,
        "follower_count": follower_count,
    })))
}
