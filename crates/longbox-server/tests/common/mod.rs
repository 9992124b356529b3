//! Shared setup for server integration tests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use longbox_audit_capture::{AuditAction, AuditFilter};
use longbox_common_core::UserId;
use longbox_rbac::Role;
use longbox_server::{routes::create_router, AppState, Identity};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn new(rbac_enabled: bool) -> Self {
        Self::from_config(longbox_test_utils::test_config(rbac_enabled)).await
    }

    /// An app whose database starts with the bootstrap administrator.
    pub async fn with_admin(rbac_enabled: bool) -> Self {
        let mut config = longbox_test_utils::test_config(rbac_enabled);
        config.bootstrap.admin_username = ADMIN_USERNAME.to_string();
        config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());
        Self::from_config(config).await
    }

    pub async fn from_config(config: longbox_common_config::LongboxConfig) -> Self {
        let state = AppState::new(config).await.expect("app state");
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// A `Cookie` header value carrying a fresh session for `identity`.
    pub fn cookie_for(&self, identity: &Identity) -> String {
        let token = self.state.sessions.issue(identity).expect("issue session");
        format!("{}={}", self.state.sessions.cookie_name(), token)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log in through the API and return the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> (TestResponse, Option<String>) {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                None,
                serde_json::json!({ "username": username, "password": password }),
            ))
            .await;
        let cookie = response
            .headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        (response, cookie)
    }

    pub async fn audit_count(&self, action: AuditAction) -> u64 {
        self.state
            .audit
            .get_audit_logs(&AuditFilter::new().action(action))
            .await
            .expect("query audit log")
            .count
    }

    /// The `action` count once it reaches `expected`, or the last count seen.
    /// Business-path audit writes land in the background after the response.
    pub async fn settled_audit_count(&self, action: AuditAction, expected: u64) -> u64 {
        longbox_test_utils::eventually(move || async move {
            self.audit_count(action).await == expected
        })
        .await;
        self.audit_count(action).await
    }
}

pub fn identity(role: Role, username: &str) -> Identity {
    Identity::new(UserId::new(), role, username)
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::DELETE).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}
