//! User accounts: storage, passwords and the administrative operations.

pub mod directory;
pub mod error;
pub mod password;
pub mod service;
pub mod types;

pub use directory::{SqliteUserDirectory, UserDirectory};
pub use error::AccountError;
pub use service::{AccountService, LoginOutcome};
pub use types::{NewUser, UserRecord, UserSummary};
