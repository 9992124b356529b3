//! Session resolution: request in, [`Identity`] or nothing out.

pub mod context;
pub mod extractor;
pub mod resolver;
pub mod token;
pub mod types;

pub use context::RequestContext;
pub use extractor::{Auth, MaybeAuth};
pub use resolver::{
    extract_credential, CookieSessionResolver, IdentityProvider, ProviderSessionResolver,
    SessionResolver,
};
pub use token::{SessionError, SessionIssuer};
pub use types::{Identity, SessionClaims};
