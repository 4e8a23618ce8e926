//! Goals module
//!
//! Savings goals with a three-state status.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{resolve_schedule, Goal, GoalChanges, GoalStatus, NewGoal};
pub use repository::{GoalRepository, PgGoalRepository};
pub use service::GoalService;
