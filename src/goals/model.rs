//! Goal models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::DomainError;

/// Goal progress. Any transition between the three is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::NotStarted => "not_started",
            GoalStatus::InProgress => "in_progress",
            GoalStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(GoalStatus::NotStarted),
            "in_progress" => Ok(GoalStatus::InProgress),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub save_frequency: Option<String>,
    pub duration: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_date: Option<DateTime<Utc>>,
    pub status: GoalStatus,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Validated fields of a goal to create. New goals always start `not_started`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub save_frequency: Option<String>,
    pub duration: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_date: Option<DateTime<Utc>>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
}

/// Partial update. Outer `None` leaves a field alone; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub save_frequency: Option<Option<String>>,
    pub duration: Option<i32>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub target_date: Option<Option<DateTime<Utc>>>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
}

impl GoalChanges {
    pub fn is_empty(&self) -> bool {
        *self == GoalChanges::default()
    }

    /// Apply to an in-memory goal.
    pub fn apply(&self, goal: &mut Goal) {
        if let Some(title) = &self.title {
            goal.title = title.clone();
        }
        if let Some(description) = &self.description {
            goal.description = description.clone();
        }
        if let Some(category) = &self.category {
            goal.category = category.clone();
        }
        if let Some(save_frequency) = &self.save_frequency {
            goal.save_frequency = save_frequency.clone();
        }
        if let Some(duration) = self.duration {
            goal.duration = Some(duration);
        }
        if let Some(start_date) = self.start_date {
            goal.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            goal.end_date = end_date;
        }
        if let Some(target_date) = self.target_date {
            goal.target_date = target_date;
        }
        if let Some(amount) = self.target_amount {
            goal.target_amount = Some(amount);
        }
        if let Some(amount) = self.current_amount {
            goal.current_amount = Some(amount);
        }
    }
}

type DateChange = Option<Option<DateTime<Utc>>>;

/// Couple `end_date` and `target_date`.
///
/// A change given for only one of them is mirrored into the other. When both
/// are given each keeps its own value.
pub fn resolve_schedule(end_date: DateChange, target_date: DateChange) -> (DateChange, DateChange) {
    match (end_date, target_date) {
        (Some(end), None) => (Some(end), Some(end)),
        (None, Some(target)) => (Some(target), Some(target)),
        both => both,
    }
}
