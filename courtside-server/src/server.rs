//! HTTP surface: router, handlers and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use courtside::{Team, TeamQuery, TeamsService};
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::HttpConfig;
use crate::error::{ApiError, Result};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    teams: Arc<TeamsService>,
}

impl AppState {
    /// Wrap a team service for sharing across handlers.
    #[must_use]
    pub fn new(teams: TeamsService) -> Self {
        Self {
            teams: Arc::new(teams),
        }
    }
}

/// Build the application router.
///
/// Requests running longer than `request_timeout` answer 408.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/teams", get(list_teams))
        .route("/easternConference", get(list_eastern_conference))
        .route("/health", get(health))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(http: &HttpConfig, state: AppState) -> Result<()> {
    let router = build_router(state, Duration::from_secs(http.request_timeout_secs));
    let listener = tokio::net::TcpListener::bind(http.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "courtside listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("courtside stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!(error = %err, "cannot listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// `GET /teams`
async fn list_teams(State(state): State<AppState>) -> std::result::Result<Json<Vec<Team>>, ApiError> {
    let teams = state.teams.get_teams(TeamQuery::All).await?;
    Ok(Json(teams))
}

/// `GET /easternConference`
async fn list_eastern_conference(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<Team>>, ApiError> {
    let teams = state.teams.get_teams(TeamQuery::EasternConference).await?;
    Ok(Json(teams))
}

/// `GET /health`: liveness only, never calls upstream.
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
