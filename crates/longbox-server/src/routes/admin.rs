//! User administration and the audit log. Mounted behind an admin-only
//! [`AuthzLayer`](crate::middleware::authz::AuthzLayer).

use crate::accounts::{NewUser, UserSummary};
use crate::error::{ApiError, ApiResult};
use crate::middleware::session::{Auth, RequestContext};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use longbox_audit_capture::{AuditAction, AuditFilter, AuditOutcome, AuditPage};
use longbox_common_core::UserId;
use longbox_rbac::Role;
use serde::Deserialize;
use std::str::FromStr;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users).post(create_user))
        .route("/api/admin/users/:id/role", put(change_role))
        .route("/api/admin/users/:id", axum::routing::delete(delete_user))
        .route("/api/admin/audit-logs", get(audit_logs))
}

fn parse_user_id(raw: &str) -> ApiResult<UserId> {
    UserId::parse(raw).map_err(|_| ApiError::BadRequest(format!("invalid user id: {raw}")))
}

async fn list_users(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<UserSummary>>> {
    Ok(ApiResponse::ok(state.accounts.list_users().await?))
}

async fn create_user(
    State(state): State<AppState>,
    Auth(actor): Auth,
    context: RequestContext,
    Json(body): Json<NewUser>,
) -> ApiResult<(StatusCode, ApiResponse<UserSummary>)> {
    let user = state
        .accounts
        .create_user(&actor, body, &context.to_audit())
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(UserSummary::from(&user))))
}

#[derive(Debug, Deserialize)]
struct ChangeRole {
    role: Role,
}

async fn change_role(
    State(state): State<AppState>,
    Auth(actor): Auth,
    context: RequestContext,
    Path(id): Path<String>,
    Json(body): Json<ChangeRole>,
) -> ApiResult<ApiResponse<UserSummary>> {
    let target = parse_user_id(&id)?;
    let user = state
        .accounts
        .change_role(&actor, target, body.role, &context.to_audit())
        .await?;
    Ok(ApiResponse::ok(UserSummary::from(&user)))
}

async fn delete_user(
    State(state): State<AppState>,
    Auth(actor): Auth,
    context: RequestContext,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let target = parse_user_id(&id)?;
    state
        .accounts
        .delete_user(&actor, target, &context.to_audit())
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": target.to_string() })))
}

/// Query string for `GET /api/admin/audit-logs`.
#[derive(Debug, Default, Deserialize)]
struct AuditQuery {
    actor: Option<String>,
    target: Option<String>,
    action: Option<String>,
    resource: Option<String>,
    outcome: Option<String>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl AuditQuery {
    fn into_filter(self) -> ApiResult<AuditFilter> {
        let mut filter = AuditFilter::new().between(self.from, self.to);
        if let Some(actor) = self.actor {
            filter = filter.actor(parse_user_id(&actor)?);
        }
        if let Some(target) = self.target {
            filter = filter.target(parse_user_id(&target)?);
        }
        if let Some(action) = self.action {
            let action = AuditAction::from_str(&action)
                .map_err(|_| ApiError::BadRequest(format!("unknown audit action: {action}")))?;
            filter = filter.action(action);
        }
        if let Some(resource) = self.resource {
            filter = filter.resource(resource);
        }
        if let Some(outcome) = self.outcome {
            let outcome = AuditOutcome::from_str(&outcome)
                .map_err(|_| ApiError::BadRequest(format!("unknown audit outcome: {outcome}")))?;
            filter = filter.outcome(outcome);
        }
        filter.limit = self.limit;
        filter.offset = self.offset;
        Ok(filter)
    }
}

async fn audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> ApiResult<ApiResponse<AuditPage>> {
    let filter = query.into_filter()?;
    Ok(ApiResponse::ok(state.audit.get_audit_logs(&filter).await?))
}
