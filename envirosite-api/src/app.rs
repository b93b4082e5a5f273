/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use envirosite_api::{app::{build_router, AppState}, config::Config};
/// use envirosite_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_admin, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use envirosite_shared::mail::{build_mailer, MailError, Mailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request; everything inside is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outgoing mail
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates state with the mailer described by `config.mail`
    pub fn new(db: PgPool, config: Config) -> Result<Self, MailError> {
        let mailer = build_mailer(&config.mail)?;
        Ok(Self::with_mailer(db, config, mailer))
    }

    /// Creates state with an explicit mailer
    pub fn with_mailer(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                              public
/// /api/auth/register, /login           public
/// /api/auth/me, /profile               bearer
/// /api/admins[/:id]                    bearer
/// /api/services[/:id]                  GET public, writes bearer
/// /api/projects[/:id]                  GET public, writes bearer
/// /api/team-members[/:id]              GET public, writes bearer
/// /api/team-members/reorder            bearer
/// /api/contact                         public
/// /api/uploads/config                  public
/// everything else                      STATIC_DIR, when configured
/// ```
///
/// Middleware, outermost first: CORS, request tracing, then per-route bearer
/// authentication.
pub fn build_router(state: AppState) -> Router {
    let auth = || axum::middleware::from_fn_with_state(state.clone(), require_admin);

    let public_auth = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let session = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/profile", put(routes::auth::update_profile))
        .route_layer(auth());

    let admins = Router::new()
        .route(
            "/",
            get(routes::admins::list_admins).post(routes::admins::create_admin),
        )
        .route(
            "/:id",
            get(routes::admins::get_admin)
                .put(routes::admins::update_admin)
                .delete(routes::admins::delete_admin),
        )
        .route_layer(auth());

    let services = Router::new()
        .route("/", post(routes::services::create_service))
        .route(
            "/:id",
            put(routes::services::update_service).delete(routes::services::delete_service),
        )
        .route_layer(auth())
        .route("/", get(routes::services::list_services))
        .route("/:id", get(routes::services::get_service));

    let projects = Router::new()
        .route("/", post(routes::projects::create_project))
        .route(
            "/:id",
            put(routes::projects::update_project).delete(routes::projects::delete_project),
        )
        .route_layer(auth())
        .route("/", get(routes::projects::list_projects))
        .route("/:id", get(routes::projects::get_project));

    // `/reorder` is a static segment, so it wins over `/:id`
    let team_members = Router::new()
        .route("/", post(routes::team_members::create_team_member))
        .route("/reorder", put(routes::team_members::reorder_team_members))
        .route(
            "/:id",
            put(routes::team_members::update_team_member)
                .patch(routes::team_members::patch_team_member)
                .delete(routes::team_members::delete_team_member),
        )
        .route_layer(auth())
        .route("/", get(routes::team_members::list_team_members))
        .route("/:id", get(routes::team_members::get_team_member));

    let api = Router::new()
        .nest("/auth", public_auth.merge(session))
        .nest("/admins", admins)
        .nest("/services", services)
        .nest("/projects", projects)
        .nest("/team-members", team_members)
        .route("/contact", post(routes::contact::submit_contact))
        .route("/uploads/config", get(routes::uploads::upload_config));

    let cors = cors_layer(&state.config.api.cors_origins);

    let mut router = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api);

    if let Some(dir) = &state.config.api.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static front-end");
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).not_found_service(index));
    }

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Permissive when `origins` contains `*`, otherwise an explicit allow-list
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
