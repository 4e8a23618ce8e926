//! Authenticated identity
//!
//! The caller behind a validated bearer token, handed to every handler that
//! touches user-owned data.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identity decoded from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// Owning user id; every repository query is scoped by it
    pub id: String,
    pub email: String,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        &self.id
    }
}
