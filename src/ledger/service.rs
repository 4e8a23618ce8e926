//! Ledger service
//!
//! Month lifecycle, entry booking, categories and plans for the caller.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::model::{
    BorrowEntry, Category, EarningEntry, Month, MonthCreation, MonthSummary, NewBorrow, NewEarning,
    NewSpending, Plan, Repayment, SpendingEntry, UpsertOutcome,
};
use super::repository::LedgerRepository;
use crate::db::RepositoryError;
use crate::domain::{
    require_amount, require_max_len, require_text, AuthenticatedUser, MonthKey, MAX_CATEGORY_LEN,
};
use crate::error::{AppError, AppResult};

pub struct LedgerService {
    repository: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    // =========================================================================
    // Months
    // =========================================================================

    pub async fn list_months(&self, caller: &AuthenticatedUser) -> AppResult<Vec<Month>> {
        Ok(self.repository.list_months(caller.user_id()).await?)
    }

    pub async fn ensure_month(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
    ) -> AppResult<()> {
        Ok(self.repository.ensure_month(caller.user_id(), month).await?)
    }

    /// Create a month and seed zero plans for every category.
    pub async fn create_month(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
    ) -> AppResult<MonthCreation> {
        let creation = self
            .repository
            .create_month_with_seeds(caller.user_id(), month)
            .await?;

        tracing::info!(
            user_id = %caller.id,
            month = %month,
            created = creation.created,
            seeded = creation.seeded.len(),
            "Month created"
        );
        Ok(creation)
    }

    pub async fn month_summary(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
    ) -> AppResult<MonthSummary> {
        Ok(self.repository.month_summary(caller.user_id(), month).await?)
    }

    pub async fn delete_month(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
    ) -> AppResult<()> {
        self.repository
            .delete_month_cascade(caller.user_id(), month)
            .await?;
        tracing::info!(user_id = %caller.id, month = %month, "Month deleted");
        Ok(())
    }

    // =========================================================================
    // Spending
    // =========================================================================

    pub async fn list_spending(
        &self,
        caller: &AuthenticatedUser,
        month: Option<&MonthKey>,
    ) -> AppResult<Vec<SpendingEntry>> {
        Ok(self.repository.list_spending(caller.user_id(), month).await?)
    }

    pub async fn add_spending(
        &self,
        caller: &AuthenticatedUser,
        mut entry: NewSpending,
    ) -> AppResult<SpendingEntry> {
        entry.category = require_text("category", &entry.category)?;
        require_max_len("category", &entry.category, MAX_CATEGORY_LEN)?;
        require_amount("amount", entry.amount)?;

        self.ensure_month(caller, &entry.date.month_key).await?;
        Ok(self.repository.insert_spending(caller.user_id(), entry).await?)
    }

    pub async fn delete_spending(&self, caller: &AuthenticatedUser, id: &str) -> AppResult<()> {
        Ok(self.repository.delete_spending(caller.user_id(), id).await?)
    }

    // =========================================================================
    // Earnings
    // =========================================================================

    pub async fn list_earnings(
        &self,
        caller: &AuthenticatedUser,
        month: Option<&MonthKey>,
    ) -> AppResult<Vec<EarningEntry>> {
        Ok(self.repository.list_earnings(caller.user_id(), month).await?)
    }

    pub async fn add_earning(
        &self,
        caller: &AuthenticatedUser,
        mut entry: NewEarning,
    ) -> AppResult<EarningEntry> {
        entry.source = require_text("source", &entry.source)?;
        require_amount("amount", entry.amount)?;

        self.ensure_month(caller, &entry.date.month_key).await?;
        Ok(self.repository.insert_earning(caller.user_id(), entry).await?)
    }

    pub async fn delete_earning(&self, caller: &AuthenticatedUser, id: &str) -> AppResult<()> {
        Ok(self.repository.delete_earning(caller.user_id(), id).await?)
    }

    // =========================================================================
    // Borrows
    // =========================================================================

    pub async fn list_borrows(
        &self,
        caller: &AuthenticatedUser,
        month: Option<&MonthKey>,
    ) -> AppResult<Vec<BorrowEntry>> {
        Ok(self.repository.list_borrows(caller.user_id(), month).await?)
    }

    pub async fn add_borrow(
        &self,
        caller: &AuthenticatedUser,
        mut entry: NewBorrow,
    ) -> AppResult<BorrowEntry> {
        entry.lender = require_text("from", &entry.lender)?;
        require_amount("amount", entry.amount)?;

        self.ensure_month(caller, &entry.date.month_key).await?;
        Ok(self.repository.insert_borrow(caller.user_id(), entry).await?)
    }

    pub async fn record_repayment(
        &self,
        caller: &AuthenticatedUser,
        id: &str,
        repayment: Repayment,
    ) -> AppResult<()> {
        require_amount("repaidAmount", repayment.amount)?;
        Ok(self
            .repository
            .record_repayment(caller.user_id(), id, repayment)
            .await?)
    }

    pub async fn delete_borrow(&self, caller: &AuthenticatedUser, id: &str) -> AppResult<()> {
        Ok(self.repository.delete_borrow(caller.user_id(), id).await?)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self, caller: &AuthenticatedUser) -> AppResult<Vec<Category>> {
        Ok(self.repository.list_categories(caller.user_id()).await?)
    }

    pub async fn add_category(
        &self,
        caller: &AuthenticatedUser,
        name: &str,
    ) -> AppResult<Category> {
        let name = require_text("name", name)?;
        require_max_len("name", &name, MAX_CATEGORY_LEN)?;

        self.repository
            .insert_category(caller.user_id(), &name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AppError::Conflict(format!("category '{name}' already exists"))
                }
                other => other.into(),
            })
    }

    pub async fn delete_category(&self, caller: &AuthenticatedUser, name: &str) -> AppResult<()> {
        Ok(self.repository.delete_category(caller.user_id(), name).await?)
    }

    // =========================================================================
    // Plans
    // =========================================================================

    pub async fn list_plans(
        &self,
        caller: &AuthenticatedUser,
        month: Option<&MonthKey>,
    ) -> AppResult<Vec<Plan>> {
        Ok(self.repository.list_plans(caller.user_id(), month).await?)
    }

    /// Set the planned amount for a category, creating the plan if needed.
    pub async fn upsert_plan(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
        category: &str,
        planned_amount: Decimal,
    ) -> AppResult<(Plan, UpsertOutcome)> {
        let category = require_text("category", category)?;
        require_max_len("category", &category, MAX_CATEGORY_LEN)?;
        require_amount("plannedAmount", planned_amount)?;

        self.ensure_month(caller, month).await?;
        Ok(self
            .repository
            .upsert_plan(caller.user_id(), month, &category, planned_amount)
            .await?)
    }

    pub async fn delete_plan(
        &self,
        caller: &AuthenticatedUser,
        month: &MonthKey,
        category: &str,
    ) -> AppResult<()> {
        Ok(self
            .repository
            .delete_plan(caller.user_id(), month, category)
            .await?)
    }
}
