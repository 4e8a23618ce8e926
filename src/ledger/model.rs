//! Ledger models
//!
//! Months, the entries booked into them, categories and plans.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::domain::EntryDate;

/// A per-user monthly bucket
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Month {
    pub user_id: String,
    pub month_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SpendingEntry {
    pub id: String,
    pub user_id: String,
    pub month_key: String,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EarningEntry {
    pub id: String,
    pub user_id: String,
    pub month_key: String,
    pub source: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Money borrowed from someone, optionally (partly) repaid
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowEntry {
    pub id: String,
    pub user_id: String,
    pub month_key: String,
    #[serde(rename = "from")]
    pub lender: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub repaid_amount: Option<Decimal>,
    pub repaid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Planned spending for one category in one month
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub user_id: String,
    pub month_key: String,
    pub category: String,
    pub planned_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Everything booked into one month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month_key: String,
    pub spending: Vec<SpendingEntry>,
    pub earnings: Vec<EarningEntry>,
    pub borrows: Vec<BorrowEntry>,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone)]
pub struct NewSpending {
    pub amount: Decimal,
    pub category: String,
    pub date: EntryDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEarning {
    pub source: String,
    pub amount: Decimal,
    pub date: EntryDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBorrow {
    pub lender: String,
    pub amount: Decimal,
    pub date: EntryDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repayment {
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

/// Whether an upsert inserted a new row or changed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Result of explicit month creation
#[derive(Debug, Clone, PartialEq)]
pub struct MonthCreation {
    pub month: Month,
    /// False when the month already existed
    pub created: bool,
    /// Zero plans added for categories that had none
    pub seeded: Vec<Plan>,
}
