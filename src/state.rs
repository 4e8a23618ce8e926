//! Shared application state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthService, CredentialStore, PgCredentialStore, TokenIssuer};
use crate::goals::{GoalRepository, GoalService, PgGoalRepository};
use crate::ledger::{LedgerRepository, LedgerService, PgLedgerRepository};

/// Services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub goals: Arc<GoalService>,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        goals: Arc<dyn GoalRepository>,
        ledger: Arc<dyn LedgerRepository>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(credentials, tokens)),
            goals: Arc::new(GoalService::new(goals)),
            ledger: Arc::new(LedgerService::new(ledger)),
        }
    }

    /// Wire the PostgreSQL repositories onto one pool.
    pub fn from_pool(pool: PgPool, tokens: TokenIssuer) -> Self {
        Self::new(
            Arc::new(PgCredentialStore::new(pool.clone())),
            Arc::new(PgGoalRepository::new(pool.clone())),
            Arc::new(PgLedgerRepository::new(pool)),
            tokens,
        )
    }
}
