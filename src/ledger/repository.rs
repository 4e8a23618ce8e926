//! Ledger repository
//!
//! Months, entries, categories and plans, always scoped by user id. Entries
//! and plans reference their month, so the month row has to exist first.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::model::{
    BorrowEntry, Category, EarningEntry, Month, MonthCreation, MonthSummary, NewBorrow, NewEarning,
    NewSpending, Plan, Repayment, SpendingEntry, UpsertOutcome,
};
use crate::db::{RepositoryError, RepositoryResult};
use crate::domain::MonthKey;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    // Months
    async fn list_months(&self, user_id: &str) -> RepositoryResult<Vec<Month>>;
    /// Idempotent; concurrent callers never see a uniqueness error.
    async fn ensure_month(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()>;
    /// Create the month if absent and give every category without a plan a
    /// zero plan, atomically.
    async fn create_month_with_seeds(
        &self,
        user_id: &str,
        month: &MonthKey,
    ) -> RepositoryResult<MonthCreation>;
    async fn month_summary(&self, user_id: &str, month: &MonthKey)
        -> RepositoryResult<MonthSummary>;
    /// Remove the month with its entries and plans; `NotFound` if absent.
    async fn delete_month_cascade(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()>;

    // Spending
    async fn list_spending(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<SpendingEntry>>;
    async fn insert_spending(&self, user_id: &str, entry: NewSpending)
        -> RepositoryResult<SpendingEntry>;
    async fn delete_spending(&self, user_id: &str, id: &str) -> RepositoryResult<()>;

    // Earnings
    async fn list_earnings(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<EarningEntry>>;
    async fn insert_earning(&self, user_id: &str, entry: NewEarning)
        -> RepositoryResult<EarningEntry>;
    async fn delete_earning(&self, user_id: &str, id: &str) -> RepositoryResult<()>;

    // Borrows
    async fn list_borrows(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<BorrowEntry>>;
    async fn insert_borrow(&self, user_id: &str, entry: NewBorrow) -> RepositoryResult<BorrowEntry>;
    async fn record_repayment(
        &self,
        user_id: &str,
        id: &str,
        repayment: Repayment,
    ) -> RepositoryResult<()>;
    async fn delete_borrow(&self, user_id: &str, id: &str) -> RepositoryResult<()>;

    // Categories
    async fn list_categories(&self, user_id: &str) -> RepositoryResult<Vec<Category>>;
    /// `Conflict` when the user already has the category.
    async fn insert_category(&self, user_id: &str, name: &str) -> RepositoryResult<Category>;
    async fn delete_category(&self, user_id: &str, name: &str) -> RepositoryResult<()>;

    // Plans
    async fn list_plans(&self, user_id: &str, month: Option<&MonthKey>)
        -> RepositoryResult<Vec<Plan>>;
    async fn upsert_plan(
        &self,
        user_id: &str,
        month: &MonthKey,
        category: &str,
        planned_amount: Decimal,
    ) -> RepositoryResult<(Plan, UpsertOutcome)>;
    async fn delete_plan(&self, user_id: &str, month: &MonthKey, category: &str)
        -> RepositoryResult<()>;
}

fn not_found(resource: &str) -> RepositoryError {
    RepositoryError::NotFound(resource.to_string())
}

fn expect_one(rows_affected: u64, resource: &str) -> RepositoryResult<()> {
    if rows_affected == 0 {
        return Err(not_found(resource));
    }
    Ok(())
}

#[derive(Debug, FromRow)]
struct PlanUpsertRow {
    #[sqlx(flatten)]
    plan: Plan,
    inserted: bool,
}

/// PostgreSQL-backed ledger repository
#[derive(Debug, Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn list_months(&self, user_id: &str) -> RepositoryResult<Vec<Month>> {
        let months = sqlx::query_as::<_, Month>(
            r#"
            SELECT user_id, month_key, created_at
            FROM months
            WHERE user_id = $1
            ORDER BY month_key DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(months)
    }

    async fn ensure_month(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO months (user_id, month_key, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, month_key) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn create_month_with_seeds(
        &self,
        user_id: &str,
        month: &MonthKey,
    ) -> RepositoryResult<MonthCreation> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Month>(
            r#"
            INSERT INTO months (user_id, month_key, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, month_key) DO NOTHING
            RETURNING user_id, month_key, created_at
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let created = inserted.is_some();
        let month_row = match inserted {
            Some(row) => row,
            None => {
                sqlx::query_as::<_, Month>(
                    "SELECT user_id, month_key, created_at FROM months WHERE user_id = $1 AND month_key = $2",
                )
                .bind(user_id)
                .bind(month.as_str())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM categories WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut seeded = Vec::new();
        for category in categories {
            let plan = sqlx::query_as::<_, Plan>(
                r#"
                INSERT INTO plans (id, user_id, month_key, category, planned_amount, created_at)
                VALUES ($1, $2, $3, $4, 0, NOW())
                ON CONFLICT (user_id, month_key, category) DO NOTHING
                RETURNING id, user_id, month_key, category, planned_amount, created_at
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(month.as_str())
            .bind(&category)
            .fetch_optional(&mut *tx)
            .await?;

            seeded.extend(plan);
        }

        tx.commit().await?;

        Ok(MonthCreation {
            month: month_row,
            created,
            seeded,
        })
    }

    async fn month_summary(
        &self,
        user_id: &str,
        month: &MonthKey,
    ) -> RepositoryResult<MonthSummary> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let spending = sqlx::query_as::<_, SpendingEntry>(
            r#"
            SELECT id, user_id, month_key, amount, category, date, note, created_at
            FROM spending_entries
            WHERE user_id = $1 AND month_key = $2
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let earnings = sqlx::query_as::<_, EarningEntry>(
            r#"
            SELECT id, user_id, month_key, source, amount, date, note, created_at
            FROM earning_entries
            WHERE user_id = $1 AND month_key = $2
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let borrows = sqlx::query_as::<_, BorrowEntry>(
            r#"
            SELECT id, user_id, month_key, lender, amount, date, note, repaid_amount,
                   repaid_date, created_at
            FROM borrow_entries
            WHERE user_id = $1 AND month_key = $2
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT id, user_id, month_key, category, planned_amount, created_at
            FROM plans
            WHERE user_id = $1 AND month_key = $2
            ORDER BY category ASC
            "#,
        )
        .bind(user_id)
        .bind(month.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MonthSummary {
            month_key: month.to_string(),
            spending,
            earnings,
            borrows,
            plans,
        })
    }

    async fn delete_month_cascade(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        for table in ["spending_entries", "earning_entries", "borrow_entries", "plans"] {
            let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND month_key = $2");
            sqlx::query(&sql)
                .bind(user_id)
                .bind(month.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM months WHERE user_id = $1 AND month_key = $2")
            .bind(user_id)
            .bind(month.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(not_found("month"));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_spending(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<SpendingEntry>> {
        let entries = sqlx::query_as::<_, SpendingEntry>(
            r#"
            SELECT id, user_id, month_key, amount, category, date, note, created_at
            FROM spending_entries
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR month_key = $2)
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.map(MonthKey::as_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn insert_spending(
        &self,
        user_id: &str,
        entry: NewSpending,
    ) -> RepositoryResult<SpendingEntry> {
        let created = sqlx::query_as::<_, SpendingEntry>(
            r#"
            INSERT INTO spending_entries (id, user_id, month_key, amount, category, date, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, user_id, month_key, amount, category, date, note, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(entry.date.month_key.as_str())
        .bind(entry.amount)
        .bind(&entry.category)
        .bind(entry.date.at)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_spending(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM spending_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "spending entry")
    }

    async fn list_earnings(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<EarningEntry>> {
        let entries = sqlx::query_as::<_, EarningEntry>(
            r#"
            SELECT id, user_id, month_key, source, amount, date, note, created_at
            FROM earning_entries
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR month_key = $2)
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.map(MonthKey::as_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn insert_earning(
        &self,
        user_id: &str,
        entry: NewEarning,
    ) -> RepositoryResult<EarningEntry> {
        let created = sqlx::query_as::<_, EarningEntry>(
            r#"
            INSERT INTO earning_entries (id, user_id, month_key, source, amount, date, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, user_id, month_key, source, amount, date, note, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(entry.date.month_key.as_str())
        .bind(&entry.source)
        .bind(entry.amount)
        .bind(entry.date.at)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_earning(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM earning_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "earning entry")
    }

    async fn list_borrows(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<BorrowEntry>> {
        let entries = sqlx::query_as::<_, BorrowEntry>(
            r#"
            SELECT id, user_id, month_key, lender, amount, date, note, repaid_amount,
                   repaid_date, created_at
            FROM borrow_entries
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR month_key = $2)
            ORDER BY date DESC, created_at DESC, id
            "#,
        )
        .bind(user_id)
        .bind(month.map(MonthKey::as_str))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn insert_borrow(
        &self,
        user_id: &str,
        entry: NewBorrow,
    ) -> RepositoryResult<BorrowEntry> {
        let created = sqlx::query_as::<_, BorrowEntry>(
            r#"
            INSERT INTO borrow_entries (id, user_id, month_key, lender, amount, date, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id, user_id, month_key, lender, amount, date, note, repaid_amount,
                      repaid_date, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(entry.date.month_key.as_str())
        .bind(&entry.lender)
        .bind(entry.amount)
        .bind(entry.date.at)
        .bind(&entry.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn record_repayment(
        &self,
        user_id: &str,
        id: &str,
        repayment: Repayment,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE borrow_entries
            SET repaid_amount = $1, repaid_date = $2
            WHERE id = $3 AND user_id = $4
            "#,
        )
        .bind(repayment.amount)
        .bind(repayment.date)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected(), "borrow entry")
    }

    async fn delete_borrow(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM borrow_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "borrow entry")
    }

    async fn list_categories(&self, user_id: &str) -> RepositoryResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT user_id, name, created_at FROM categories WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn insert_category(&self, user_id: &str, name: &str) -> RepositoryResult<Category> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (user_id, name, created_at)
            VALUES ($1, $2, NOW())
            RETURNING user_id, name, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_category(&self, user_id: &str, name: &str) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE user_id = $1 AND name = $2")
            .bind(user_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        expect_one(result.rows_affected(), "category")
    }

    async fn list_plans(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<Plan>> {
        let plans = match month {
            Some(month) => {
                sqlx::query_as::<_, Plan>(
                    r#"
                    SELECT id, user_id, month_key, category, planned_amount, created_at
                    FROM plans
                    WHERE user_id = $1 AND month_key = $2
                    ORDER BY category ASC
                    "#,
                )
                .bind(user_id)
                .bind(month.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Plan>(
                    r#"
                    SELECT id, user_id, month_key, category, planned_amount, created_at
                    FROM plans
                    WHERE user_id = $1
                    ORDER BY month_key DESC, category ASC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(plans)
    }

    async fn upsert_plan(
        &self,
        user_id: &str,
        month: &MonthKey,
        category: &str,
        planned_amount: Decimal,
    ) -> RepositoryResult<(Plan, UpsertOutcome)> {
        // xmax is zero only for a freshly inserted row version
        let row = sqlx::query_as::<_, PlanUpsertRow>(
            r#"
            INSERT INTO plans (id, user_id, month_key, category, planned_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, month_key, category)
            DO UPDATE SET planned_amount = EXCLUDED.planned_amount
            RETURNING id, user_id, month_key, category, planned_amount, created_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(month.as_str())
        .bind(category)
        .bind(planned_amount)
        .fetch_one(&self.pool)
        .await?;

        let outcome = if row.inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };
        Ok((row.plan, outcome))
    }

    async fn delete_plan(
        &self,
        user_id: &str,
        month: &MonthKey,
        category: &str,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "DELETE FROM plans WHERE user_id = $1 AND month_key = $2 AND category = $3",
        )
        .bind(user_id)
        .bind(month.as_str())
        .bind(category)
        .execute(&self.pool)
        .await?;

        expect_one(result.rows_affected(), "plan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_one() {
        assert!(expect_one(1, "plan").is_ok());
        assert!(matches!(
            expect_one(0, "plan"),
            Err(RepositoryError::NotFound(ref r)) if r == "plan"
        ));
    }
}
