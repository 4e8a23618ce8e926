//! Ledger module
//!
//! Monthly money tracking: spending, earnings, borrows, categories and plans.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{
    BorrowEntry, Category, EarningEntry, Month, MonthCreation, MonthSummary, NewBorrow, NewEarning,
    NewSpending, Plan, Repayment, SpendingEntry, UpsertOutcome,
};
pub use repository::{LedgerRepository, PgLedgerRepository};
pub use service::LedgerService;
