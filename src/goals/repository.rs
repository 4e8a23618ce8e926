//! Goal repository
//!
//! Every query is scoped by the owning user id. A goal owned by someone else
//! is indistinguishable from a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::model::{Goal, GoalChanges, GoalStatus, NewGoal};
use crate::db::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Goals of `user_id`, newest first
    async fn list(&self, user_id: &str) -> RepositoryResult<Vec<Goal>>;
    async fn find(&self, user_id: &str, goal_id: &str) -> RepositoryResult<Goal>;
    async fn insert(&self, user_id: &str, goal: NewGoal) -> RepositoryResult<Goal>;
    async fn update_status(
        &self,
        user_id: &str,
        goal_id: &str,
        status: GoalStatus,
    ) -> RepositoryResult<()>;
    async fn update(
        &self,
        user_id: &str,
        goal_id: &str,
        changes: &GoalChanges,
    ) -> RepositoryResult<Goal>;
    async fn delete(&self, user_id: &str, goal_id: &str) -> RepositoryResult<()>;
}

fn goal_not_found() -> RepositoryError {
    RepositoryError::NotFound("goal".to_string())
}

/// Row shape; status is checked on the way out.
#[derive(Debug, FromRow)]
struct GoalRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    category: Option<String>,
    save_frequency: Option<String>,
    duration: Option<i32>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    target_date: Option<DateTime<Utc>>,
    status: String,
    target_amount: Option<Decimal>,
    current_amount: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<GoalRow> for Goal {
    type Error = RepositoryError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<GoalStatus>().map_err(|e| {
            RepositoryError::Database(sqlx::Error::Decode(Box::new(e)))
        })?;

        Ok(Goal {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category: row.category,
            save_frequency: row.save_frequency,
            duration: row.duration,
            start_date: row.start_date,
            end_date: row.end_date,
            target_date: row.target_date,
            status,
            target_amount: row.target_amount,
            current_amount: row.current_amount,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed goal repository
#[derive(Debug, Clone)]
pub struct PgGoalRepository {
    pool: PgPool,
}

impl PgGoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GoalRepository for PgGoalRepository {
    async fn list(&self, user_id: &str) -> RepositoryResult<Vec<Goal>> {
        let rows = sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT id, user_id, title, description, category, save_frequency, duration,
                   start_date, end_date, target_date, status, target_amount, current_amount,
                   created_at
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Goal::try_from).collect()
    }

    async fn find(&self, user_id: &str, goal_id: &str) -> RepositoryResult<Goal> {
        sqlx::query_as::<_, GoalRow>(
            r#"
            SELECT id, user_id, title, description, category, save_frequency, duration,
                   start_date, end_date, target_date, status, target_amount, current_amount,
                   created_at
            FROM goals
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(goal_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(goal_not_found)?
        .try_into()
    }

    async fn insert(&self, user_id: &str, goal: NewGoal) -> RepositoryResult<Goal> {
        sqlx::query_as::<_, GoalRow>(
            r#"
            INSERT INTO goals (
                id, user_id, title, description, category, save_frequency, duration,
                start_date, end_date, target_date, status, target_amount, current_amount,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
            RETURNING id, user_id, title, description, category, save_frequency, duration,
                      start_date, end_date, target_date, status, target_amount, current_amount,
                      created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&goal.title)
        .bind(&goal.description)
        .bind(&goal.category)
        .bind(&goal.save_frequency)
        .bind(goal.duration)
        .bind(goal.start_date)
        .bind(goal.end_date)
        .bind(goal.target_date)
        .bind(GoalStatus::NotStarted.as_str())
        .bind(goal.target_amount)
        .bind(goal.current_amount)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn update_status(
        &self,
        user_id: &str,
        goal_id: &str,
        status: GoalStatus,
    ) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE goals SET status = $1 WHERE id = $2 AND user_id = $3")
            .bind(status.as_str())
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(goal_not_found());
        }
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        goal_id: &str,
        changes: &GoalChanges,
    ) -> RepositoryResult<Goal> {
        if changes.is_empty() {
            return self.find(user_id, goal_id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE goals SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(title) = &changes.title {
                fields.push("title = ").push_bind_unseparated(title.clone());
            }
            if let Some(description) = &changes.description {
                fields.push("description = ").push_bind_unseparated(description.clone());
            }
            if let Some(category) = &changes.category {
                fields.push("category = ").push_bind_unseparated(category.clone());
            }
            if let Some(save_frequency) = &changes.save_frequency {
                fields.push("save_frequency = ").push_bind_unseparated(save_frequency.clone());
            }
            if let Some(duration) = changes.duration {
                fields.push("duration = ").push_bind_unseparated(duration);
            }
            if let Some(start_date) = changes.start_date {
                fields.push("start_date = ").push_bind_unseparated(start_date);
            }
            if let Some(end_date) = changes.end_date {
                fields.push("end_date = ").push_bind_unseparated(end_date);
            }
            if let Some(target_date) = changes.target_date {
                fields.push("target_date = ").push_bind_unseparated(target_date);
            }
            if let Some(amount) = changes.target_amount {
                fields.push("target_amount = ").push_bind_unseparated(amount);
            }
            if let Some(amount) = changes.current_amount {
                fields.push("current_amount = ").push_bind_unseparated(amount);
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(goal_id.to_string())
            .push(" AND user_id = ")
            .push_bind(user_id.to_string())
            .push(
                " RETURNING id, user_id, title, description, category, save_frequency, duration, \
                 start_date, end_date, target_date, status, target_amount, current_amount, created_at",
            );

        builder
            .build_query_as::<GoalRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(goal_not_found)?
            .try_into()
    }

    async fn delete(&self, user_id: &str, goal_id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(goal_not_found());
        }
        Ok(())
    }
}
