/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use smarthelper_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = smarthelper_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use smarthelper_shared::{
    auth::{jwt, middleware::AuthContext},
    notify::Notifier,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Shared HTTP client for outbound calls (webhooks, upload relay)
    pub http: reqwest::Client,

    /// Outbound email-webhook notifier
    pub notifier: Notifier,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let http = reqwest::Client::new();
        let notifier = Notifier::new(
            http.clone(),
            config.webhooks.registration_url.clone(),
            config.webhooks.application_url.clone(),
        );

        Self {
            db,
            config: Arc::new(config),
            http,
            notifier,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /v1/                           # API v1 (versioned)
/// │   ├── /auth/                     # Authentication
/// │   │   ├── POST /register
/// │   │   ├── POST /login
/// │   │   ├── POST /refresh
/// │   │   ├── GET  /profile          # (authenticated)
/// │   │   └── PUT  /profile          # (authenticated)
/// │   ├── /jobs/                     # Job postings
/// │   ├── /applications/             # Job applications
/// │   ├── /attendance/               # Face gate + attendance scans
/// │   ├── /payments/                 # Billing and reconciliation
/// │   ├── /reviews/                  # Post-payment reviews
/// │   ├── /posts/                    # Community feed
/// │   └── /uploads/                  # Image upload relay
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route-group basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth routes
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Profile routes (require JWT)
    let auth_private = Router::new()
        .route("/profile", get(routes::auth::get_profile))
        .route("/profile", put(routes::auth::update_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let job_routes = Router::new()
        .route("/", post(routes::jobs::create_job))
        .route("/", get(routes::jobs::list_jobs))
        .route("/:id", get(routes::jobs::get_job))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let application_routes = Router::new()
        .route("/", post(routes::applications::apply))
        .route("/helper", get(routes::applications::list_for_helper))
        .route("/family", get(routes::applications::list_for_family))
        .route("/:id/accept", post(routes::applications::accept))
        .route("/:id/reject", post(routes::applications::reject))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let attendance_routes = Router::new()
        .route("/face", get(routes::attendance::get_face))
        .route("/face", post(routes::attendance::register_face))
        .route("/scan", post(routes::attendance::scan))
        .route("/helper", get(routes::attendance::list_for_helper))
        .route("/family", get(routes::attendance::list_for_family))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let payment_routes = Router::new()
        .route("/", post(routes::payments::create_payment))
        .route("/family", get(routes::payments::list_for_family))
        .route("/helper", get(routes::payments::list_for_helper))
        .route("/:id/receive", post(routes::payments::mark_received))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let review_routes = Router::new()
        .route("/", post(routes::reviews::create_review))
        .route("/family", get(routes::reviews::list_for_family))
        .route("/family/pending", get(routes::reviews::pending_for_family))
        .route("/helper/:id", get(routes::reviews::list_for_helper))
        .route("/helper/:id/summary", get(routes::reviews::rating_summary))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let post_routes = Router::new()
        .route("/", post(routes::posts::create_post))
        .route("/", get(routes::posts::feed))
        .route("/:id", delete(routes::posts::delete_post))
        .route("/follow/:author_id", post(routes::posts::toggle_follow))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let upload_routes = Router::new()
        .route("/image", post(routes::uploads::upload_image))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/jobs", job_routes)
        .nest("/applications", application_routes)
        .nest("/attendance", attendance_routes)
        .nest("/payments", payment_routes)
        .nest("/reviews", review_routes)
        .nest("/posts", post_routes)
        .nest("/uploads", upload_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates JWT token from Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::from_jwt(claims.sub, claims.role);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
