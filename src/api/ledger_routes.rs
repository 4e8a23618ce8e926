//! Ledger endpoints
//!
//! Spending, earnings, borrows, categories, plans and months.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::domain::{
    parse_flexible_date, parse_month_filter, AuthenticatedUser, EntryDate, MonthKey,
};
use crate::error::AppError;
use crate::ledger::{
    BorrowEntry, Category, EarningEntry, Month, MonthSummary, NewBorrow, NewEarning, NewSpending,
    Plan, Repayment, SpendingEntry, UpsertOutcome,
};
use crate::state::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    #[serde(default)]
    pub month: Option<String>,
}

impl MonthQuery {
    fn month_key(&self) -> Result<Option<MonthKey>, AppError> {
        Ok(parse_month_filter(self.month.as_deref())?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSpendingRequest {
    pub amount: Decimal,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEarningRequest {
    pub source: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBorrowRequest {
    pub from: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentRequest {
    pub repaid_amount: Decimal,
    pub repaid_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPlanRequest {
    pub month_key: String,
    pub category: String,
    pub planned_amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonthRequest {
    pub month_key: String,
}

fn note(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =========================================================================
// Router
// =========================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/spending", get(list_spending).post(create_spending))
        .route("/spending/:id", delete(delete_spending))
        .route("/earnings", get(list_earnings).post(create_earning))
        .route("/earnings/:id", delete(delete_earning))
        .route("/borrows", get(list_borrows).post(create_borrow))
        .route("/borrows/:id", delete(delete_borrow))
        .route("/borrows/:id/repayment", patch(record_repayment))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:name", delete(delete_category))
        .route("/plans", get(list_plans).post(upsert_plan))
        .route("/plans/:month/:category", delete(delete_plan))
        .route("/months", get(list_months).post(create_month))
        .route("/months/:month", delete(delete_month))
        .route("/months/:month/summary", get(month_summary))
}

// =========================================================================
// Spending
// =========================================================================

async fn list_spending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Json<Vec<SpendingEntry>>, AppError> {
    let month = query.month_key()?;
    Ok(Json(state.ledger.list_spending(&user, month.as_ref()).await?))
}

async fn create_spending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateSpendingRequest>,
) -> Result<(StatusCode, Json<SpendingEntry>), AppError> {
    let entry = NewSpending {
        amount: request.amount,
        category: request.category,
        date: EntryDate::parse(&request.date)?,
        note: note(request.note),
    };

    let created = state.ledger.add_spending(&user, entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_spending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_spending(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Earnings
// =========================================================================

async fn list_earnings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Json<Vec<EarningEntry>>, AppError> {
    let month = query.month_key()?;
    Ok(Json(state.ledger.list_earnings(&user, month.as_ref()).await?))
}

async fn create_earning(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateEarningRequest>,
) -> Result<(StatusCode, Json<EarningEntry>), AppError> {
    let entry = NewEarning {
        source: request.source,
        amount: request.amount,
        date: EntryDate::parse(&request.date)?,
        note: note(request.note),
    };

    let created = state.ledger.add_earning(&user, entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_earning(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_earning(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Borrows
// =========================================================================

async fn list_borrows(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Json<Vec<BorrowEntry>>, AppError> {
    let month = query.month_key()?;
    Ok(Json(state.ledger.list_borrows(&user, month.as_ref()).await?))
}

async fn create_borrow(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateBorrowRequest>,
) -> Result<(StatusCode, Json<BorrowEntry>), AppError> {
    let entry = NewBorrow {
        lender: request.from,
        amount: request.amount,
        date: EntryDate::parse(&request.date)?,
        note: note(request.note),
    };

    let created = state.ledger.add_borrow(&user, entry).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn record_repayment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<RepaymentRequest>,
) -> Result<StatusCode, AppError> {
    let repayment = Repayment {
        amount: request.repaid_amount,
        date: parse_flexible_date(&request.repaid_date)?.with_timezone(&Utc),
    };

    state.ledger.record_repayment(&user, &id, repayment).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_borrow(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_borrow(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Categories
// =========================================================================

async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.ledger.list_categories(&user).await?))
}

async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state.ledger.add_category(&user, &request.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(name): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    state.ledger.delete_category(&user, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Plans
// =========================================================================

async fn list_plans(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Json<Vec<Plan>>, AppError> {
    let month = query.month_key()?;
    Ok(Json(state.ledger.list_plans(&user, month.as_ref()).await?))
}

/// 201 when the plan was inserted, 200 when an existing one was updated
async fn upsert_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<UpsertPlanRequest>,
) -> Result<(StatusCode, Json<Plan>), AppError> {
    let month = MonthKey::parse(&request.month_key)?;
    let (plan, outcome) = state
        .ledger
        .upsert_plan(&user, &month, &request.category, request.planned_amount)
        .await?;

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(plan)))
}

async fn delete_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath((month, category)): ApiPath<(String, String)>,
) -> Result<StatusCode, AppError> {
    let month = MonthKey::parse(&month)?;
    state.ledger.delete_plan(&user, &month, &category).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Months
// =========================================================================

async fn list_months(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Month>>, AppError> {
    Ok(Json(state.ledger.list_months(&user).await?))
}

/// 201 for a new month, 200 when it already existed
async fn create_month(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateMonthRequest>,
) -> Result<(StatusCode, Json<Month>), AppError> {
    let month = MonthKey::parse(&request.month_key)?;
    let creation = state.ledger.create_month(&user, &month).await?;

    let status = if creation.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(creation.month)))
}

async fn month_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(month): ApiPath<String>,
) -> Result<Json<MonthSummary>, AppError> {
    let month = MonthKey::parse(&month)?;
    Ok(Json(state.ledger.month_summary(&user, &month).await?))
}

async fn delete_month(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiPath(month): ApiPath<String>,
) -> Result<StatusCode, AppError> {
    let month = MonthKey::parse(&month)?;
    state.ledger.delete_month(&user, &month).await?;
    Ok(StatusCode::NO_CONTENT)
}
