/// Social feed: posts and followers
///
/// A small community layer on top of the marketplace. Any user can post,
/// follow another user, and browse the global feed. Following is a toggle
/// and self-follows are rejected.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Post model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    /// Unique post ID
    pub id: Uuid,

    /// Posting user
    pub author_id: Uuid,

    /// Post text
    pub description: String,

    /// Optional attached image URL
    pub image_url: Option<String>,

    /// When the post was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    /// Posting user
    pub author_id: Uuid,

    /// Post text
    pub description: String,

    /// Optional attached image URL
    pub image_url: Option<String>,
}

/// Feed entry: a post with author display fields and follow state
/// relative to the viewing user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedPost {
    /// Post ID
    pub id: Uuid,

    /// Posting user
    pub author_id: Uuid,

    /// Author display name
    pub author_name: String,

    /// Author avatar URL
    pub author_avatar_url: Option<String>,

    /// Author marketplace role
    pub author_role: crate::models::user::UserRole,

    /// Post text
    pub description: String,

    /// Optional attached image URL
    pub image_url: Option<String>,

    /// Number of users following the author
    pub follower_count: i64,

    /// Whether the viewing user follows the author
    pub is_following: bool,

    /// When the post was created
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Creates a new post
    pub async fn create(pool: &PgPool, data: CreatePost) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, description, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, description, image_url, created_at
            "#,
        )
        .bind(data.author_id)
        .bind(data.description)
        .bind(data.image_url)
        .fetch_one(pool)
        .await
    }

    /// Global feed, newest first, annotated for the viewing user
    pub async fn feed(pool: &PgPool, viewer_id: Uuid) -> Result<Vec<FeedPost>, sqlx::Error> {
        sqlx::query_as::<_, FeedPost>(
            r#"
            SELECT p.id, p.author_id,
                   u.name AS author_name, u.avatar_url AS author_avatar_url,
                   u.role AS author_role,
                   p.description, p.image_url,
                   (SELECT COUNT(*) FROM followers f
                    WHERE f.author_id = p.author_id) AS follower_count,
                   EXISTS (SELECT 1 FROM followers f
                           WHERE f.author_id = p.author_id
                             AND f.follower_id = $1) AS is_following,
                   p.created_at
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(viewer_id)
        .fetch_all(pool)
        .await
    }

    /// Deletes a post; only the author may delete
    ///
    /// Returns false when the post does not exist or belongs to someone
    /// else.
    pub async fn delete(pool: &PgPool, id: Uuid, author_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Follower relationship operations
pub struct Follower;

impl Follower {
    /// Toggles the follow relationship; returns true when now following
    ///
    /// Self-follows are rejected with `sqlx::Error::RowNotFound` so the
    /// caller can report a 400 without a separate check.
    pub async fn toggle(
        pool: &PgPool,
        author_id: Uuid,
        follower_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        if author_id == follower_id {
            return Err(sqlx::Error::RowNotFound);
        }

        let deleted = sqlx::query(
            "DELETE FROM followers WHERE author_id = $1 AND follower_id = $2",
        )
        .bind(author_id)
        .bind(follower_id)
        .execute(pool)
        .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO followers (author_id, follower_id) VALUES ($1, $2) \
             ON CONFLICT (author_id, follower_id) DO NOTHING",
        )
        .bind(author_id)
        .bind(follower_id)
        .execute(pool)
        .await?;

        Ok(true)
    }

    /// Counts the users following an author
    pub async fn count(pool: &PgPool, author_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM followers WHERE author_id = $1")
                .bind(author_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
