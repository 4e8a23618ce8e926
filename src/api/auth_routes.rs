//! Auth endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extract::ApiJson;
use crate::auth::PublicUser;
use crate::domain::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthenticatedUser,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current: String,
    pub new: String,
}

// =========================================================================
// Routers
// =========================================================================

/// Routes reachable without a token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes behind the access guard
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/profile", patch(update_profile))
        .route("/auth/password", patch(change_password))
}

// =========================================================================
// Handlers
// =========================================================================

async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = state
        .auth
        .register(&request.email, &request.password, &request.name)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at,
        user: outcome.user,
    }))
}

async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<StatusCode, AppError> {
    state.auth.update_name(&user, &request.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .change_password(&user, &request.current, &request.new)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_name_is_optional() {
        let json = r#"{"email": "ann@example.com", "password": "secret1"}"#;
        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.email, "ann@example.com");
        assert_eq!(request.name, "");
    }

    #[test]
    fn test_change_password_request() {
        let json = r#"{"current": "old-secret", "new": "new-secret"}"#;
        let request: ChangePasswordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.current, "old-secret");
        assert_eq!(request.new, "new-secret");
    }

    #[test]
    fn test_login_response_shape() {
        let response = LoginResponse {
            token: "t".into(),
            expires_at: Utc::now(),
            user: PublicUser {
                id: "u-1".into(),
                email: "ann@example.com".into(),
                name: "Ann".into(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("expiresAt").is_some());
        assert_eq!(json["user"]["email"], "ann@example.com");
        assert!(json["user"].get("passwordHash").is_none());
    }
}
