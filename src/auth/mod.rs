//! Authentication module
//!
//! Accounts, password hashing and bearer tokens.

pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use service::{normalize_email, AuthService, LoginOutcome};
pub use store::{CredentialStore, NewUser, PgCredentialStore, PublicUser, User};
pub use token::{Claims, IssuedToken, TokenIssuer, ISSUER, TOKEN_TTL_HOURS};
