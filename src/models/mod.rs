mod budget;
mod category;
mod transaction;

pub use budget::{Budget, BudgetEntry};
pub use category::{Category, CategoryKind};
pub use transaction::{
    month_of, parse_date, parse_month, Transaction, TransactionType, MAX_AMOUNT,
};
