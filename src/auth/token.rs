//! Bearer tokens
//!
//! HS256-signed JWTs carrying the caller's identity.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::store::PublicUser;
use crate::config::JwtSecret;
use crate::domain::AuthenticatedUser;
use crate::error::AppError;

/// Token lifetime
pub const TOKEN_TTL_HOURS: i64 = 24;

/// `iss` claim stamped on every token and required on validation
pub const ISSUER: &str = "achieving-backend";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates bearer tokens with one server secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &JwtSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Sign a token for `user`, valid from now.
    pub fn issue(&self, user: &PublicUser) -> Result<IssuedToken, AppError> {
        self.issue_at(user, Utc::now())
    }

    /// Sign a token for `user` as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        user: &PublicUser,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: ISSUER.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature, expiry and issuer, yielding the caller identity.
    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::InvalidToken
        })?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(AppError::InvalidToken);
        }

        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or(AppError::InvalidToken)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthenticatedUser {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            issued_at,
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
