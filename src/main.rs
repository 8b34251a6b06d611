//! Pull Request Reviewer Backend
//!
//! A REST backend that tracks teams and pull requests in SQLite and rotates
//! reviewers according to configurable eligibility rules.

mod api;
mod config;
mod db;
mod errors;
mod models;
mod review;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use review::{
    EligibilityPolicy, PullRequestLifecycle, ReassignmentCoordinator, ReviewerSelector,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub lifecycle: Arc<PullRequestLifecycle<Repository>>,
    pub reassigner: Arc<ReassignmentCoordinator<Repository>>,
}

impl AppState {
    pub fn new(repo: Repository, config: &Config) -> Self {
        let selector = ReviewerSelector::new(EligibilityPolicy::new(config.rules.clone()));
        Self {
            lifecycle: Arc::new(PullRequestLifecycle::new(repo.clone())),
            reassigner: Arc::new(ReassignmentCoordinator::new(repo.clone(), selector)),
            repo: Arc::new(repo),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("Starting PR Reviewer Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        allow_reuse = config.rules.allows_reuse(),
        "Reviewer eligibility rules: {:?}",
        config.rules
    );

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Repository::new(pool);

    let app = create_router(AppState::new(repo, &config));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Teams
        .route("/team/add", post(api::create_team))
        .route("/team/get/{team_name}", get(api::get_team))
        // Users
        .route("/users/setIsActive", post(api::set_is_active))
        .route("/users/getReview/{user_id}", get(api::get_reviews))
        // Pull requests
        .route("/pullRequest/create", post(api::create_pull_request))
        .route("/pullRequest/merge", post(api::merge_pull_request))
        .route("/pullRequest/reassign", post(api::reassign_reviewer))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
