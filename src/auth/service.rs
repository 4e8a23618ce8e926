//! Auth service
//!
//! Registration, login, token validation and credential changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::password::{self, MIN_PASSWORD_LEN};
use super::store::{CredentialStore, NewUser, PublicUser};
use super::token::TokenIssuer;
use crate::db::RepositoryError;
use crate::domain::{require_max_len, require_text, AuthenticatedUser, DomainError, MAX_EMAIL_LEN};
use crate::error::{AppError, AppResult};

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

/// Trim and lowercase an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_length(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Create an account and return its public profile.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AppResult<PublicUser> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(DomainError::EmailRequired.into());
        }
        require_max_len("email", &email, MAX_EMAIL_LEN)?;
        check_password_length(password)?;

        let password_hash = password::hash_password(password).await?;
        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            email,
            name: name.trim().to_string(),
            password_hash,
        };

        let user = self.store.create(new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::EmailTaken,
            other => other.into(),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.public())
    }

    /// Verify credentials and issue a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let email = normalize_email(email);

        let user = match self.store.find_by_email(&email).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound(_)) => {
                password::verify_against_dummy(password).await?;
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !password::verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let public = user.public();
        let issued = self.tokens.issue(&public)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginOutcome {
            token: issued.token,
            expires_at: issued.expires_at,
            user: public,
        })
    }

    /// Validate a bearer token.
    pub fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        self.tokens.validate(token)
    }

    /// Replace the caller's password after checking the current one.
    pub async fn change_password(
        &self,
        caller: &AuthenticatedUser,
        current: &str,
        new: &str,
    ) -> AppResult<()> {
        check_password_length(new)?;

        let user = match self.store.find_by_id(caller.user_id()).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound(_)) => return Err(AppError::InvalidToken),
            Err(e) => return Err(e.into()),
        };

        if !password::verify_password(current, &user.password_hash).await? {
            return Err(AppError::IncorrectPassword);
        }

        let password_hash = password::hash_password(new).await?;
        self.store.update_password(&user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Change the caller's display name.
    pub async fn update_name(&self, caller: &AuthenticatedUser, name: &str) -> AppResult<()> {
        let name = require_text("name", name)?;
        self.store.update_name(caller.user_id(), &name).await?;
        Ok(())
    }
}
