//! Login, logout and the current session.

use crate::accounts::AccountError;
use crate::error::ApiResult;
use crate::middleware::authz::{AuthzConfig, AuthzLayer};
use crate::middleware::session::{Auth, Identity, RequestContext};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use longbox_rbac::{Permission, RoleDescription};
use serde::{Deserialize, Serialize};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route(
            "/api/auth/me",
            get(me).route_layer(AuthzLayer::new(state.authorizer.clone(), AuthzConfig::new())),
        )
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// The signed-in user as the UI sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: Identity,
    pub role: RoleDescription,
    /// `resource.action` strings the role currently holds. Advisory for the UI.
    pub permissions: Vec<String>,
}

async fn session_view(state: &AppState, identity: Identity) -> SessionView {
    let permissions = state
        .evaluator
        .permissions_for(identity.role)
        .await
        .iter()
        .map(Permission::to_string)
        .collect();
    SessionView {
        role: identity.role.describe(),
        user: identity,
        permissions,
    }
}

async fn login(
    State(state): State<AppState>,
    context: RequestContext,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let outcome = state
        .accounts
        .login(&body.username, &body.password, &context.to_audit())
        .await?;
    let cookie = state
        .sessions
        .set_cookie_header(&outcome.token)
        .map_err(AccountError::from)?;

    let mut response = ApiResponse::ok(session_view(&state, outcome.identity).await).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn logout(State(state): State<AppState>, request: Request<Body>) -> ApiResult<Response> {
    let (parts, _) = request.into_parts();
    let identity = state.authorizer.resolve_identity(&parts).await;
    let context = RequestContext::from_parts(&parts);
    state
        .accounts
        .logout(identity.as_ref(), &context.to_audit())
        .await;

    let cookie = state
        .sessions
        .clear_cookie_header()
        .map_err(AccountError::from)?;
    let mut response = ApiResponse::ok(serde_json::json!({ "loggedOut": true })).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn me(State(state): State<AppState>, Auth(identity): Auth) -> ApiResponse<SessionView> {
    ApiResponse::ok(session_view(&state, identity).await)
}
