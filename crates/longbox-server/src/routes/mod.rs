//! Route configuration for the Longbox API server.

mod admin;
mod auth;
mod internal;
mod permissions;

use crate::middleware::authz::{AuthzConfig, AuthzLayer};
use crate::state::AppState;
use axum::{
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    Router,
};
use longbox_rbac::Role;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");
    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )));

    let admin_only = AuthzLayer::new(
        state.authorizer.clone(),
        AuthzConfig::new().require_role(Role::Admin),
    );

    Router::new()
        .merge(internal::router())
        .merge(auth::router(&state))
        .merge(admin::router().route_layer(admin_only.clone()))
        .merge(permissions::router(&state, admin_only))
        .fallback(fallback_handler)
        .layer(common_middleware)
        .with_state(state)
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "success": false,
            "error": {
                "code": "not_found",
                "message": "The requested resource was not found"
            }
        })),
    )
}
