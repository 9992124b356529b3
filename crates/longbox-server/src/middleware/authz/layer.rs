//! Authorization middleware layer.

use super::authorizer::Authorizer;
use super::types::AuthzConfig;
use axum::{body::Body, http::Request, response::Response};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Runs [`Authorizer::admit`] in front of every request to the wrapped
/// service. Rejections are answered here; the inner service only sees
/// approved requests, with the [`Identity`](crate::middleware::session::Identity)
/// in their extensions.
#[derive(Clone)]
pub struct AuthzLayer {
    authorizer: Authorizer,
    config: Arc<AuthzConfig>,
}

impl AuthzLayer {
    pub fn new(authorizer: Authorizer, config: AuthzConfig) -> Self {
        Self {
            authorizer,
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for AuthzLayer {
    type Service = AuthzMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthzMiddleware {
            inner,
            authorizer: self.authorizer.clone(),
            config: self.config.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthzMiddleware<S> {
    inner: S,
    authorizer: Authorizer,
    config: Arc<AuthzConfig>,
}

impl<S> Service<Request<Body>> for AuthzMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authorizer = self.authorizer.clone();
        let config = self.config.clone();

        Box::pin(async move {
            match authorizer.admit(req, &config).await {
                Ok((_, req)) => inner.call(req).await,
                Err(rejection) => Ok(rejection),
            }
        })
    }
}
