//! Domain module
//!
//! Value types and validation rules shared by the services.

pub mod dates;
pub mod error;
pub mod identity;
pub mod month;

pub use dates::{parse_date_update, parse_flexible_date, EntryDate};
pub use error::{
    require_amount, require_max_len, require_text, DomainError,
    MAX_CATEGORY_LEN, MAX_EMAIL_LEN,
};
pub use identity::AuthenticatedUser;
pub use month::{parse_month_filter, MonthKey};
