//! Grant matrix administration and diagnostics.

use crate::error::{ApiError, ApiResult};
use crate::middleware::authz::{protect, AuthzConfig, AuthzLayer};
use crate::middleware::session::{Identity, RequestContext};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{FromRequest, Query, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use longbox_rbac::{Action, Grant, Permission, RbacMode, Resource, Role, RoleDescription};
use serde::{Deserialize, Serialize};

pub fn router(state: &AppState, admin_only: AuthzLayer) -> Router<AppState> {
    let edit_state = state.clone();
    let edit = protect(
        state.authorizer.clone(),
        AuthzConfig::new()
            .require_role(Role::Admin)
            .require_permission(Permission::new(Resource::SETTINGS, Action::Update)),
        move |identity: Identity, request: Request<Body>| {
            update_permissions(edit_state.clone(), identity, request)
        },
    );

    let settings_reader = AuthzLayer::new(
        state.authorizer.clone(),
        AuthzConfig::new().require_permission(Permission::new(Resource::SETTINGS, Action::Read)),
    );

    Router::new()
        .route(
            "/api/admin/permissions",
            get(list_permissions).route_layer(admin_only).put(edit),
        )
        .route(
            "/api/permissions/roles",
            get(roles_with_permission).route_layer(settings_reader),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleInfo {
    role: Role,
    #[serde(flatten)]
    description: RoleDescription,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PermissionsView {
    mode: RbacMode,
    roles: Vec<RoleInfo>,
    grants: Vec<Grant>,
}

async fn permissions_view(state: &AppState) -> ApiResult<PermissionsView> {
    let matrix = state.evaluator.snapshot().await?;
    Ok(PermissionsView {
        mode: state.evaluator.mode(),
        roles: Role::all()
            .map(|role| RoleInfo {
                role,
                description: role.describe(),
            })
            .collect(),
        grants: matrix.grants(),
    })
}

async fn list_permissions(State(state): State<AppState>) -> ApiResult<ApiResponse<PermissionsView>> {
    Ok(ApiResponse::ok(permissions_view(&state).await?))
}

/// One grant edit as sent by the admin UI.
#[derive(Debug, Deserialize)]
struct GrantEdit {
    role: String,
    resource: String,
    action: String,
    granted: bool,
}

#[derive(Debug, Deserialize)]
struct GrantEdits {
    grants: Vec<GrantEdit>,
}

async fn update_permissions(state: AppState, identity: Identity, request: Request<Body>) -> Response {
    match apply_edits(&state, &identity, request).await {
        Ok(view) => ApiResponse::ok(view).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn apply_edits(
    state: &AppState,
    identity: &Identity,
    request: Request<Body>,
) -> ApiResult<PermissionsView> {
    let (parts, body) = request.into_parts();
    let audit_context = RequestContext::from_parts(&parts).to_audit();
    let Json(edits) = Json::<GrantEdits>::from_request(Request::from_parts(parts, body), &())
        .await
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    // Reject the whole batch before writing any row.
    let mut parsed = Vec::with_capacity(edits.grants.len());
    for edit in edits.grants {
        let role = Role::parse(&edit.role)?;
        let permission = Permission::new(Resource::parse(&edit.resource)?, Action::parse(&edit.action)?);
        permission.ensure_supported()?;
        parsed.push((role, permission, edit.granted));
    }

    for (role, permission, granted) in parsed {
        state.evaluator.set(role, &permission, granted).await?;
        state
            .audit
            .log_permission_change(&identity.to_actor(), role, &permission, granted, &audit_context)
            .detach();
    }

    permissions_view(state).await
}

#[derive(Debug, Deserialize)]
struct RolesQuery {
    resource: String,
    action: String,
}

#[derive(Debug, Serialize)]
struct RolesView {
    permission: String,
    roles: Vec<Role>,
}

async fn roles_with_permission(
    State(state): State<AppState>,
    Query(query): Query<RolesQuery>,
) -> ApiResult<ApiResponse<RolesView>> {
    let resource = Resource::parse(&query.resource)?;
    let action = Action::parse(&query.action)?;
    let roles = state.evaluator.roles_with_permission(&resource, action).await;
    Ok(ApiResponse::ok(RolesView {
        permission: Permission::new(resource, action).to_string(),
        roles,
    }))
}
