//! Guarding a single handler.

use super::authorizer::Authorizer;
use super::types::AuthzConfig;
use crate::middleware::session::Identity;
use axum::{body::Body, http::Request, response::Response};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Wrap `handler` so it runs only after `config` is satisfied.
///
/// The returned closure is itself an axum handler. A rejected request gets the
/// structured 401 or 403 response and `handler` is never called. An approved
/// request reaches `handler` with the resolved identity, which is also in the
/// request extensions.
pub fn protect<H, Fut>(
    authorizer: Authorizer,
    config: AuthzConfig,
    handler: H,
) -> impl Fn(Request<Body>) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    H: Fn(Identity, Request<Body>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let config = Arc::new(config);
    move |request: Request<Body>| -> BoxFuture<'static, Response> {
        let authorizer = authorizer.clone();
        let config = config.clone();
        let handler = handler.clone();
        Box::pin(async move {
            match authorizer.admit(request, &config).await {
                Ok((identity, request)) => handler(identity, request).await,
                Err(rejection) => rejection,
            }
        })
    }
}
