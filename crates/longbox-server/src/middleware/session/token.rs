//! Session cookie encoding and decoding.

use super::types::{Identity, SessionClaims};
use axum::http::{header::InvalidHeaderValue, HeaderValue};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use longbox_common_config::SessionConfig;
use thiserror::Error;
use tracing::debug;

/// Errors minting a session credential.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to encode session token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("session cookie is not a valid header value")]
    Header(#[from] InvalidHeaderValue),
}

/// Signs and verifies self-encoded session credentials.
///
/// The credential is the source of truth for the caller's role until it
/// expires. Role changes reach existing sessions only on the next login.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
    ttl_secs: i64,
    secure: bool,
}

impl SessionIssuer {
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            cookie_name: config.cookie_name.clone(),
            ttl_secs: i64::try_from(config.ttl_secs).unwrap_or(i64::MAX / 2),
            secure: config.secure_cookie,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a credential for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<String, SessionError> {
        self.issue_claims(&SessionClaims::new(identity, self.ttl_secs))
    }

    pub fn issue_claims(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Decode a credential. Bad signatures, expired tokens and malformed
    /// claims all come back as `None`.
    pub fn decode(&self, token: &str) -> Option<Identity> {
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => data.claims.into_identity(),
            Err(err) => {
                debug!(error = %err, "Session credential rejected");
                None
            }
        }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn set_cookie_header(&self, token: &str) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie_name, token, self.ttl_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(HeaderValue::from_str(&cookie)?)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie_header(&self) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        Ok(HeaderValue::from_str(&cookie)?)
    }
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("cookie_name", &self.cookie_name)
            .field("ttl_secs", &self.ttl_secs)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use longbox_common_core::UserId;
    use longbox_rbac::Role;

    fn config(secret: &str) -> SessionConfig {
        SessionConfig {
            secret: secret.to_string(),
            ..SessionConfig::default()
        }
    }

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(&config("test_secret_key_that_is_32_chars!"))
    }

    #[test]
    fn test_issue_decode_roundtrip() {
        let issuer = issuer();
        let identity = Identity::new(UserId::new(), Role::Lister, "lister");
        let token = issuer.issue(&identity).unwrap();
        assert_eq!(issuer.decode(&token), Some(identity));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let identity = Identity::new(UserId::new(), Role::Admin, "root");
        let token = issuer().issue(&identity).unwrap();
        let other = SessionIssuer::new(&config("a_completely_different_secret_32b"));
        assert_eq!(other.decode(&token), None);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer();
        let identity = Identity::new(UserId::new(), Role::Viewer, "v");
        let mut claims = SessionClaims::new(&identity, 60);
        claims.iat = Utc::now().timestamp() - 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issuer.issue_claims(&claims).unwrap();
        assert_eq!(issuer.decode(&token), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(issuer().decode("not.a.jwt"), None);
        assert_eq!(issuer().decode(""), None);
    }

    #[test]
    fn test_cookie_headers() {
        let issuer = issuer();
        let set = issuer.set_cookie_header("abc").unwrap();
        let set = set.to_str().unwrap();
        assert!(set.starts_with("longbox_session=abc;"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("SameSite=Lax"));
        assert!(!set.contains("Secure"));

        let clear = issuer.clear_cookie_header().unwrap();
        assert!(clear.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_secure_flag() {
        let mut cfg = config("test_secret_key_that_is_32_chars!");
        cfg.secure_cookie = true;
        let set = SessionIssuer::new(&cfg).set_cookie_header("abc").unwrap();
        assert!(set.to_str().unwrap().ends_with("; Secure"));
    }
}
