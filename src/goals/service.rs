//! Goal service

use std::sync::Arc;

use super::model::{resolve_schedule, Goal, GoalChanges, GoalStatus, NewGoal};
use super::repository::GoalRepository;
use crate::domain::{require_amount, require_text, AuthenticatedUser};
use crate::error::AppResult;

pub struct GoalService {
    repository: Arc<dyn GoalRepository>,
}

impl GoalService {
    pub fn new(repository: Arc<dyn GoalRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, caller: &AuthenticatedUser) -> AppResult<Vec<Goal>> {
        Ok(self.repository.list(caller.user_id()).await?)
    }

    /// Create a goal in `not_started`.
    pub async fn create(&self, caller: &AuthenticatedUser, mut goal: NewGoal) -> AppResult<Goal> {
        goal.title = require_text("title", &goal.title)?;
        check_amounts(goal.target_amount, goal.current_amount)?;

        let (end_date, target_date) =
            resolve_schedule(goal.end_date.map(Some), goal.target_date.map(Some));
        goal.end_date = end_date.flatten();
        goal.target_date = target_date.flatten();

        let created = self.repository.insert(caller.user_id(), goal).await?;
        tracing::info!(user_id = %caller.id, goal_id = %created.id, "Goal created");
        Ok(created)
    }

    pub async fn update_status(
        &self,
        caller: &AuthenticatedUser,
        goal_id: &str,
        status: GoalStatus,
    ) -> AppResult<()> {
        self.repository
            .update_status(caller.user_id(), goal_id, status)
            .await?;
        tracing::info!(user_id = %caller.id, goal_id, status = %status, "Goal status changed");
        Ok(())
    }

    /// Apply a partial update and return the stored goal.
    pub async fn update(
        &self,
        caller: &AuthenticatedUser,
        goal_id: &str,
        mut changes: GoalChanges,
    ) -> AppResult<Goal> {
        if let Some(title) = &changes.title {
            changes.title = Some(require_text("title", title)?);
        }
        check_amounts(changes.target_amount, changes.current_amount)?;

        let (end_date, target_date) = resolve_schedule(changes.end_date, changes.target_date);
        changes.end_date = end_date;
        changes.target_date = target_date;

        Ok(self
            .repository
            .update(caller.user_id(), goal_id, &changes)
            .await?)
    }

    pub async fn delete(&self, caller: &AuthenticatedUser, goal_id: &str) -> AppResult<()> {
        self.repository.delete(caller.user_id(), goal_id).await?;
        tracing::info!(user_id = %caller.id, goal_id, "Goal deleted");
        Ok(())
    }
}

fn check_amounts(
    target: Option<rust_decimal::Decimal>,
    current: Option<rust_decimal::Decimal>,
) -> AppResult<()> {
    if let Some(amount) = target {
        require_amount("targetAmount", amount)?;
    }
    if let Some(amount) = current {
        require_amount("currentAmount", amount)?;
    }
    Ok(())
}
