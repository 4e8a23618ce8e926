//! Common test utilities
//!
//! An in-memory implementation of every repository trait, so the full router
//! can be driven without a database.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use achieving_api::auth::{CredentialStore, NewUser, TokenIssuer, User};
use achieving_api::build_router;
use achieving_api::config::JwtSecret;
use achieving_api::db::{RepositoryError, RepositoryResult};
use achieving_api::domain::MonthKey;
use achieving_api::goals::{Goal, GoalChanges, GoalRepository, GoalStatus, NewGoal};
use achieving_api::ledger::{
    BorrowEntry, Category, EarningEntry, LedgerRepository, Month, MonthCreation, MonthSummary,
    NewBorrow, NewEarning, NewSpending, Plan, Repayment, SpendingEntry, UpsertOutcome,
};
use achieving_api::AppState;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    goals: Vec<Goal>,
    months: Vec<Month>,
    spending: Vec<SpendingEntry>,
    earnings: Vec<EarningEntry>,
    borrows: Vec<BorrowEntry>,
    categories: Vec<Category>,
    plans: Vec<Plan>,
}

/// In-memory stand-in for PostgreSQL
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn password_hash(&self, email: &str) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.password_hash.clone())
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn month_count(&self, user_id: &str) -> usize {
        self.lock()
            .months
            .iter()
            .filter(|m| m.user_id == user_id)
            .count()
    }
}

fn not_found(resource: &str) -> RepositoryError {
    RepositoryError::NotFound(resource.to_string())
}

fn in_month(month_key: &str, filter: Option<&MonthKey>) -> bool {
    filter.map_or(true, |m| m.as_str() == month_key)
}

macro_rules! sort_entries {
    ($entries:expr) => {
        $entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
                .then(a.id.cmp(&b.id))
        })
    };
}

fn has_month(tables: &Tables, user_id: &str, month_key: &str) -> bool {
    tables
        .months
        .iter()
        .any(|m| m.user_id == user_id && m.month_key == month_key)
}

fn ensure_month_in(tables: &mut Tables, user_id: &str, month_key: &str) -> bool {
    if has_month(tables, user_id, month_key) {
        return false;
    }
    tables.months.push(Month {
        user_id: user_id.to_string(),
        month_key: month_key.to_string(),
        created_at: Utc::now(),
    });
    true
}

/// Mirror of the foreign key from entries and plans to months
fn require_month(tables: &Tables, user_id: &str, month_key: &str) -> RepositoryResult<()> {
    if has_month(tables, user_id, month_key) {
        Ok(())
    } else {
        Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
            "month {month_key} missing for {user_id}"
        ))))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| not_found("user"))
    }

    async fn find_by_id(&self, user_id: &str) -> RepositoryResult<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| not_found("user"))
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: user.id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_password(&self, user_id: &str, password_hash: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| not_found("user"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_name(&self, user_id: &str, name: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| not_found("user"))?;
        user.name = name.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl GoalRepository for InMemoryStore {
    async fn list(&self, user_id: &str) -> RepositoryResult<Vec<Goal>> {
        let mut goals: Vec<Goal> = self
            .lock()
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(goals)
    }

    async fn find(&self, user_id: &str, goal_id: &str) -> RepositoryResult<Goal> {
        self.lock()
            .goals
            .iter()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .cloned()
            .ok_or_else(|| not_found("goal"))
    }

    async fn insert(&self, user_id: &str, goal: NewGoal) -> RepositoryResult<Goal> {
        let created = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: goal.title,
            description: goal.description,
            category: goal.category,
            save_frequency: goal.save_frequency,
            duration: goal.duration,
            start_date: goal.start_date,
            end_date: goal.end_date,
            target_date: goal.target_date,
            status: GoalStatus::NotStarted,
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            created_at: Utc::now(),
        };
        self.lock().goals.push(created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        user_id: &str,
        goal_id: &str,
        status: GoalStatus,
    ) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let goal = tables
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .ok_or_else(|| not_found("goal"))?;
        goal.status = status;
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        goal_id: &str,
        changes: &GoalChanges,
    ) -> RepositoryResult<Goal> {
        let mut tables = self.lock();
        let goal = tables
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .ok_or_else(|| not_found("goal"))?;
        changes.apply(goal);
        Ok(goal.clone())
    }

    async fn delete(&self, user_id: &str, goal_id: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.goals.len();
        tables
            .goals
            .retain(|g| !(g.id == goal_id && g.user_id == user_id));
        if tables.goals.len() == before {
            return Err(not_found("goal"));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for InMemoryStore {
    async fn list_months(&self, user_id: &str) -> RepositoryResult<Vec<Month>> {
        let mut months: Vec<Month> = self
            .lock()
            .months
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        months.sort_by(|a, b| b.month_key.cmp(&a.month_key));
        Ok(months)
    }

    async fn ensure_month(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()> {
        ensure_month_in(&mut self.lock(), user_id, month.as_str());
        Ok(())
    }

    async fn create_month_with_seeds(
        &self,
        user_id: &str,
        month: &MonthKey,
    ) -> RepositoryResult<MonthCreation> {
        let mut tables = self.lock();
        let created = ensure_month_in(&mut tables, user_id, month.as_str());

        let mut names: Vec<String> = tables
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.name.clone())
            .collect();
        names.sort();

        let mut seeded = Vec::new();
        for name in names {
            let exists = tables.plans.iter().any(|p| {
                p.user_id == user_id && p.month_key == month.as_str() && p.category == name
            });
            if exists {
                continue;
            }
            let plan = Plan {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                month_key: month.to_string(),
                category: name,
                planned_amount: Decimal::ZERO,
                created_at: Utc::now(),
            };
            tables.plans.push(plan.clone());
            seeded.push(plan);
        }

        let month_row = tables
            .months
            .iter()
            .find(|m| m.user_id == user_id && m.month_key == month.as_str())
            .cloned()
            .ok_or_else(|| not_found("month"))?;

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
        let filter = Some(month);
        let spending = self.list_spending(user_id, filter).await?;
        let earnings = self.list_earnings(user_id, filter).await?;
        let borrows = self.list_borrows(user_id, filter).await?;
        let plans = self.list_plans(user_id, filter).await?;

        Ok(MonthSummary {
            month_key: month.to_string(),
            spending,
            earnings,
            borrows,
            plans,
        })
    }

    async fn delete_month_cascade(&self, user_id: &str, month: &MonthKey) -> RepositoryResult<()> {
        let mut tables = self.lock();
        if !has_month(&tables, user_id, month.as_str()) {
            return Err(not_found("month"));
        }

        let key = month.as_str();
        let owned = |uid: &str, mk: &str| uid == user_id && mk == key;
        tables.spending.retain(|e| !owned(&e.user_id, &e.month_key));
        tables.earnings.retain(|e| !owned(&e.user_id, &e.month_key));
        tables.borrows.retain(|e| !owned(&e.user_id, &e.month_key));
        tables.plans.retain(|p| !owned(&p.user_id, &p.month_key));
        tables.months.retain(|m| !owned(&m.user_id, &m.month_key));
        Ok(())
    }

    async fn list_spending(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<SpendingEntry>> {
        let mut entries: Vec<SpendingEntry> = self
            .lock()
            .spending
            .iter()
            .filter(|e| e.user_id == user_id && in_month(&e.month_key, month))
            .cloned()
            .collect();
        sort_entries!(entries);
        Ok(entries)
    }

    async fn insert_spending(
        &self,
        user_id: &str,
        entry: NewSpending,
    ) -> RepositoryResult<SpendingEntry> {
        let mut tables = self.lock();
        require_month(&tables, user_id, entry.date.month_key.as_str())?;

        let created = SpendingEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            month_key: entry.date.month_key.to_string(),
            amount: entry.amount,
            category: entry.category,
            date: entry.date.at,
            note: entry.note,
            created_at: Utc::now(),
        };
        tables.spending.push(created.clone());
        Ok(created)
    }

    async fn delete_spending(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.spending.len();
        tables.spending.retain(|e| !(e.id == id && e.user_id == user_id));
        if tables.spending.len() == before {
            return Err(not_found("spending entry"));
        }
        Ok(())
    }

    async fn list_earnings(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<EarningEntry>> {
        let mut entries: Vec<EarningEntry> = self
            .lock()
            .earnings
            .iter()
            .filter(|e| e.user_id == user_id && in_month(&e.month_key, month))
            .cloned()
            .collect();
        sort_entries!(entries);
        Ok(entries)
    }

    async fn insert_earning(
        &self,
        user_id: &str,
        entry: NewEarning,
    ) -> RepositoryResult<EarningEntry> {
        let mut tables = self.lock();
        require_month(&tables, user_id, entry.date.month_key.as_str())?;

        let created = EarningEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            month_key: entry.date.month_key.to_string(),
            source: entry.source,
            amount: entry.amount,
            date: entry.date.at,
            note: entry.note,
            created_at: Utc::now(),
        };
        tables.earnings.push(created.clone());
        Ok(created)
    }

    async fn delete_earning(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.earnings.len();
        tables.earnings.retain(|e| !(e.id == id && e.user_id == user_id));
        if tables.earnings.len() == before {
            return Err(not_found("earning entry"));
        }
        Ok(())
    }

    async fn list_borrows(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<BorrowEntry>> {
        let mut entries: Vec<BorrowEntry> = self
            .lock()
            .borrows
            .iter()
            .filter(|e| e.user_id == user_id && in_month(&e.month_key, month))
            .cloned()
            .collect();
        sort_entries!(entries);
        Ok(entries)
    }

    async fn insert_borrow(
        &self,
        user_id: &str,
        entry: NewBorrow,
    ) -> RepositoryResult<BorrowEntry> {
        let mut tables = self.lock();
        require_month(&tables, user_id, entry.date.month_key.as_str())?;

        let created = BorrowEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            month_key: entry.date.month_key.to_string(),
            lender: entry.lender,
            amount: entry.amount,
            date: entry.date.at,
            note: entry.note,
            repaid_amount: None,
            repaid_date: None,
            created_at: Utc::now(),
        };
        tables.borrows.push(created.clone());
        Ok(created)
    }

    async fn record_repayment(
        &self,
        user_id: &str,
        id: &str,
        repayment: Repayment,
    ) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let entry = tables
            .borrows
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .ok_or_else(|| not_found("borrow entry"))?;
        entry.repaid_amount = Some(repayment.amount);
        entry.repaid_date = Some(repayment.date);
        Ok(())
    }

    async fn delete_borrow(&self, user_id: &str, id: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.borrows.len();
        tables.borrows.retain(|e| !(e.id == id && e.user_id == user_id));
        if tables.borrows.len() == before {
            return Err(not_found("borrow entry"));
        }
        Ok(())
    }

    async fn list_categories(&self, user_id: &str) -> RepositoryResult<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .lock()
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, user_id: &str, name: &str) -> RepositoryResult<Category> {
        let mut tables = self.lock();
        if tables
            .categories
            .iter()
            .any(|c| c.user_id == user_id && c.name == name)
        {
            return Err(RepositoryError::Conflict("categories_pkey".to_string()));
        }

        let created = Category {
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn delete_category(&self, user_id: &str, name: &str) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.categories.len();
        tables
            .categories
            .retain(|c| !(c.user_id == user_id && c.name == name));
        if tables.categories.len() == before {
            return Err(not_found("category"));
        }
        Ok(())
    }

    async fn list_plans(
        &self,
        user_id: &str,
        month: Option<&MonthKey>,
    ) -> RepositoryResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .lock()
            .plans
            .iter()
            .filter(|p| p.user_id == user_id && in_month(&p.month_key, month))
            .cloned()
            .collect();
        plans.sort_by(|a, b| {
            b.month_key
                .cmp(&a.month_key)
                .then(a.category.cmp(&b.category))
        });
        Ok(plans)
    }

    async fn upsert_plan(
        &self,
        user_id: &str,
        month: &MonthKey,
        category: &str,
        planned_amount: Decimal,
    ) -> RepositoryResult<(Plan, UpsertOutcome)> {
        let mut tables = self.lock();
        require_month(&tables, user_id, month.as_str())?;

        if let Some(plan) = tables.plans.iter_mut().find(|p| {
            p.user_id == user_id && p.month_key == month.as_str() && p.category == category
        }) {
            plan.planned_amount = planned_amount;
            return Ok((plan.clone(), UpsertOutcome::Updated));
        }

        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            month_key: month.to_string(),
            category: category.to_string(),
            planned_amount,
            created_at: Utc::now(),
        };
        tables.plans.push(plan.clone());
        Ok((plan, UpsertOutcome::Created))
    }

    async fn delete_plan(
        &self,
        user_id: &str,
        month: &MonthKey,
        category: &str,
    ) -> RepositoryResult<()> {
        let mut tables = self.lock();
        let before = tables.plans.len();
        tables.plans.retain(|p| {
            !(p.user_id == user_id && p.month_key == month.as_str() && p.category == category)
        });
        if tables.plans.len() == before {
            return Err(not_found("plan"));
        }
        Ok(())
    }
}

/// Router over a fresh in-memory store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&JwtSecret::new(TEST_SECRET))
}

pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::default());
    let state = AppState::new(store.clone(), store.clone(), store.clone(), token_issuer());

    TestApp {
        router: build_router(state, None),
        store,
    }
}

impl TestApp {
    /// Send a request and return the status with the parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": password, "name": name })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register a user and return a bearer token for them
    pub async fn signup(&self, email: &str) -> String {
        let (status, _) = self.register(email, "secret123", "Tester").await;
        assert_eq!(status, StatusCode::CREATED, "registration of {email} failed");

        let (status, body) = self.login(email, "secret123").await;
        assert_eq!(status, StatusCode::OK, "login of {email} failed");
        body["token"].as_str().unwrap().to_string()
    }
}
