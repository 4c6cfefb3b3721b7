// Bug bash API server
// Decision: The poller runs inside the API process so admin endpoints can drive it
// Decision: Leaderboard reads are public, everything under /admin needs basic auth

mod auth;
mod common;
mod participants;
mod poll;
mod scores;

use anyhow::{Context, Result};
use axum::{extract::State, middleware, routing::get, Json, Router};
use bugbash_core::{AppliedScore, FixEventMessage, Participant, ParticipantDirectory, ScoringStore};
use bugbash_storage::Database;
use bugbash_worker::{PollScheduler, PollerConfig, PollerStatus, PollerSupervision};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::AdminCredentials;
use crate::common::{ErrorResponse, ListResponse};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    poller_running: bool,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    scheduler: Arc<PollScheduler>,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        poller_running: state.scheduler.is_running().await,
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        poll::get_status,
        poll::set_cursor,
        scores::score_fix_event,
        participants::list_participants,
    ),
    components(
        schemas(
            FixEventMessage, AppliedScore, Participant, PollerStatus,
            poll::SetCursorRequest,
            scores::ScoreRequest,
            ListResponse<AppliedScore>,
            ListResponse<Participant>,
            ErrorResponse,
        )
    ),
    tags(
        (name = "admin", description = "Poller control and manual scoring (basic auth)"),
        (name = "participants", description = "Campaign leaderboards")
    ),
    info(
        title = "Bug Bash API",
        version = "0.1.0",
        description = "Scores fixed-bug events for bug bash campaign participants",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

/// Assemble every route (extracted for testing)
fn build_app(
    scheduler: Arc<PollScheduler>,
    scoring: Arc<dyn ScoringStore>,
    directory: Arc<dyn ParticipantDirectory>,
    credentials: AdminCredentials,
) -> Router {
    let admin_routes = Router::new()
        .merge(poll::routes(poll::AppState::new(scheduler.clone())))
        .merge(scores::routes(scores::AppState::new(scoring)))
        .layer(middleware::from_fn_with_state(
            credentials,
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(health).with_state(HealthState { scheduler }))
        .merge(participants::routes(participants::AppState::new(directory)))
        .merge(admin_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

/// Drain poller failures into the log until the worker goes away
fn supervise(mut supervision: PollerSupervision) {
    tokio::spawn(async move {
        while let Some(failure) = supervision.errors.recv().await {
            tracing::warn!(
                record_id = ?failure.record_id,
                error = %failure.error,
                "Fix event not scored"
            );
        }
        tracing::debug!("Poller supervision ended");
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bugbash_api=debug,bugbash_worker=debug,bugbash_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("bugbash-api starting...");

    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable required")?;
    let db = Database::from_url(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    if std::env::var("RUN_MIGRATIONS").map_or(true, |v| v != "false") {
        db.migrate().await.context("Failed to run migrations")?;
        tracing::info!("Migrations applied");
    }

    let poller_config = PollerConfig::from_env()?;
    let poller_enabled = poller_config.enabled;
    let credentials = AdminCredentials::from_env();
    if !credentials.is_configured() {
        tracing::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, admin endpoints will reject all requests");
    }

    let db = Arc::new(db);
    let scheduler = Arc::new(PollScheduler::new(
        poller_config,
        db.clone(),
        db.clone(),
        db.clone(),
    ));

    if poller_enabled {
        supervise(scheduler.start().await?);
    } else {
        tracing::info!("Poller disabled (POLLER_ENABLED=false)");
    }

    let app = build_app(scheduler.clone(), db.clone(), db, credentials);

    // Start server
    let addr = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:7777".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    scheduler.stop().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}
