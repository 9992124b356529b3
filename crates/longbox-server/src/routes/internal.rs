//! Unauthenticated endpoints: health and client configuration.

use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde::Serialize;
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/config/client", get(client_config))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    database: bool,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            ApiResponse::ok(Health {
                status: "ok",
                database: true,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::ok(Health {
                    status: "degraded",
                    database: false,
                }),
            )
        }
    }
}

/// Flags the browser may read. Advisory only: enforcement uses the server flag.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    rbac_enabled: bool,
}

async fn client_config(State(state): State<AppState>) -> ApiResponse<ClientConfig> {
    ApiResponse::ok(ClientConfig {
        rbac_enabled: state.config.features.public_rbac_enabled,
    })
}
