//! Session resolvers.

use super::token::SessionIssuer;
use super::types::Identity;
use async_trait::async_trait;
use axum::http::{header, request::Parts, HeaderMap};
use std::sync::Arc;
use tracing::warn;

/// Produces the caller's identity for a request.
///
/// A missing credential and an undecodable one both yield `None`. Resolvers
/// never fail: callers only branch on present or absent.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve_identity(&self, parts: &Parts) -> Option<Identity>;
}

/// Pull the session credential from the named cookie, falling back to a
/// `Bearer` authorization header.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Resolves identities from self-encoded session cookies. No I/O.
#[derive(Debug, Clone)]
pub struct CookieSessionResolver {
    issuer: Arc<SessionIssuer>,
}

impl CookieSessionResolver {
    pub fn new(issuer: Arc<SessionIssuer>) -> Self {
        Self { issuer }
    }
}

#[async_trait]
impl SessionResolver for CookieSessionResolver {
    async fn resolve_identity(&self, parts: &Parts) -> Option<Identity> {
        let token = extract_credential(&parts.headers, self.issuer.cookie_name())?;
        self.issuer.decode(&token)
    }
}

/// Backing lookup for opaque session ids.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn lookup(&self, session_id: &str) -> anyhow::Result<Option<Identity>>;
}

/// Resolves opaque session ids through an [`IdentityProvider`].
///
/// Every resolution is a round trip, so role changes apply to live sessions.
/// Provider failures resolve to `None`.
pub struct ProviderSessionResolver<P> {
    provider: P,
    cookie_name: String,
}

impl<P: IdentityProvider> ProviderSessionResolver<P> {
    pub fn new(provider: P, cookie_name: impl Into<String>) -> Self {
        Self {
            provider,
            cookie_name: cookie_name.into(),
        }
    }
}

#[async_trait]
impl<P: IdentityProvider> SessionResolver for ProviderSessionResolver<P> {
    async fn resolve_identity(&self, parts: &Parts) -> Option<Identity> {
        let session_id = extract_credential(&parts.headers, &self.cookie_name)?;
        match self.provider.lookup(&session_id).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(error = %err, "Identity provider lookup failed");
                None
            }
        }
    }
}
