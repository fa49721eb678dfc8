/// Face template model
///
/// One template per helper, registered once from the helper's device and
/// required before any attendance scan is accepted. The template is an
/// opaque string produced by the client-side face pipeline; the server
/// never interprets it, it only gates scanning on its presence.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Registered face template for a helper
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FaceTemplate {
    /// Unique record ID
    pub id: Uuid,

    /// Helper this template belongs to (one per helper)
    pub helper_id: Uuid,

    /// Opaque client-produced template payload
    pub template: String,

    /// When the template was first registered
    pub created_at: DateTime<Utc>,
}

impl FaceTemplate {
    /// Registers or replaces the helper's face template
    pub async fn upsert(
        pool: &PgPool,
        helper_id: Uuid,
        template: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, FaceTemplate>(
            r#"
            INSERT INTO faces (helper_id, template)
            VALUES ($1, $2)
            ON CONFLICT (helper_id) DO UPDATE SET template = EXCLUDED.template
            RETURNING id, helper_id, template, created_at
            "#,
        )
        .bind(helper_id)
        .bind(template)
        .fetch_one(pool)
        .await
    }

    /// Fetches the helper's registered template, if any
    pub async fn find_for_helper(
        pool: &PgPool,
        helper_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FaceTemplate>(
            "SELECT id, helper_id, template, created_at FROM faces WHERE helper_id = $1",
        )
        .bind(helper_id)
        .fetch_optional(pool)
        .await
    }
}
