//! Goal endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, patch, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath};
use crate::domain::{parse_date_update, parse_flexible_date, AuthenticatedUser, DomainError};
use crate::error::AppError;
use crate::goals::{Goal, GoalChanges, GoalStatus, NewGoal};
use crate::state::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub save_frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
}

/// Every field optional; an empty string clears a text or date field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub save_frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub target_date: Option<String>,
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    #[serde(default)]
    pub current_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn optional_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_flexible_date(raw).map(|d| Some(d.with_timezone(&Utc))),
    }
}

fn text_update(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
}

impl CreateGoalRequest {
    pub fn into_new_goal(self) -> Result<NewGoal, DomainError> {
        Ok(NewGoal {
            start_date: optional_date(self.start_date.as_deref())?,
            end_date: optional_date(self.end_date.as_deref())?,
            target_date: optional_date(self.target_date.as_deref())?,
            title: self.title,
            description: optional_text(self.description),
            category: optional_text(self.category),
            save_frequency: optional_text(self.save_frequency),
            duration: self.duration,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
        })
    }
}

impl UpdateGoalRequest {
    pub fn into_changes(self) -> Result<GoalChanges, DomainError> {
        Ok(GoalChanges {
            start_date: parse_date_update(self.start_date.as_deref())?,
            end_date: parse_date_update(self.end_date.as_deref())?,
            target_date: parse_date_update(self.target_date.as_deref())?,
            title: self.title,
            description: text_update(self.description),
            category: text_update(self.category),
            save_frequency: text_update(self.save_frequency),
            duration: self.duration,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
        })
    }
}

// =========================================================================
// Router
// =========================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/:id", put(update_goal).delete(delete_goal))
        .route("/goals/:id/status", patch(update_status))
}

// =========================================================================
// Handlers
// =========================================================================

async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Goal>>, AppError> {
    Ok(Json(state.goals.list(&user).await?))
}

async fn create_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let goal = state.goals.create(&user, request.into_new_goal()?).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    let status: GoalStatus = request.status.parse()?;
    state.goals.update_status(&user, &id, status).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<UpdateGoalRequest>,
) -> Result<Json<Goal>, AppError> {
    let goal = state.goals.update(&user, &id, request.into_changes()?).await?;
    Ok(Json(goal))
}

async fn delete_goal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    state.goals.delete(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_deserialize() {
        let json = r#"{
            "title": "Emergency fund",
            "saveFrequency": "monthly",
            "targetDate": "2025-12-31",
            "targetAmount": 5000
        }"#;

        let request: CreateGoalRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.save_frequency.as_deref(), Some("monthly"));
        assert_eq!(request.target_amount, Some(dec!(5000)));

        let goal = request.into_new_goal().unwrap();
        assert_eq!(
            goal.target_date,
            Some(Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(goal.end_date, None);
        assert_eq!(goal.description, None);
    }

    #[test]
    fn test_create_request_rejects_bad_date() {
        let request = CreateGoalRequest {
            title: "Trip".into(),
            description: None,
            category: None,
            save_frequency: None,
            duration: None,
            start_date: Some("next spring".into()),
            end_date: None,
            target_date: None,
            target_amount: None,
            current_amount: None,
        };
        assert!(matches!(request.into_new_goal(), Err(DomainError::InvalidDate(_))));
    }

    #[test]
    fn test_update_request_empty_string_clears() {
        let json = r#"{"description": "", "endDate": "", "category": "travel"}"#;
        let request: UpdateGoalRequest = serde_json::from_str(json).unwrap();
        let changes = request.into_changes().unwrap();

        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.end_date, Some(None));
        assert_eq!(changes.category, Some(Some("travel".to_string())));
        assert_eq!(changes.title, None);
        assert_eq!(changes.target_date, None);
    }

    #[test]
    fn test_empty_update_has_no_changes() {
        let request: UpdateGoalRequest = serde_json::from_str("{}").unwrap();
        assert!(request.into_changes().unwrap().is_empty());
    }
}
