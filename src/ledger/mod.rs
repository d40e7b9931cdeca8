//! Pure aggregation over a ledger snapshot.
//!
//! Nothing in here touches storage or the clock except
//! [`resolve_target_month`], which falls back to the current month when there
//! is no activity at all.

mod aggregate;
mod budgets;
mod filter;

pub use aggregate::{
    compute_budget_status, compute_expense_by_category, compute_totals, resolve_target_month,
    resolve_target_month_at, BudgetStatus, CategoryTotal, Totals, Usage,
};
pub use budgets::{normalize_entries, parse_budget_amount};
pub use filter::{apply_filters, CategoryFilter, Filters, TypeFilter};

use crate::models::{Budget, Category, CategoryKind, Transaction};

/// Label for spending whose category cannot be resolved.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A self-consistent copy of everything the engine reads.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRole {
    IncomeCategory,
    ExpenseCategory,
}

pub fn classify_category(category: &Category) -> CategoryRole {
    match category.kind {
        CategoryKind::Income => CategoryRole::IncomeCategory,
        CategoryKind::Expense => CategoryRole::ExpenseCategory,
    }
}

/// What the dashboard is looking at. `month: None` means "infer it".
#[derive(Debug, Clone, Default)]
pub struct ViewConfig {
    pub month: Option<String>,
    pub filters: Filters,
}

/// Every derived view the dashboard shows, computed in one pass from a snapshot.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub month: String,
    pub transaction_count: usize,
    pub totals: Totals,
    pub expense_by_category: Vec<CategoryTotal>,
    pub budget_status: Vec<BudgetStatus>,
}

impl Dashboard {
    pub fn build(snapshot: &Snapshot, view: &ViewConfig) -> Self {
        let transactions = apply_filters(&snapshot.transactions, &view.filters);
        let month = view
            .month
            .clone()
            .unwrap_or_else(|| resolve_target_month(&transactions));

        Self {
            totals: compute_totals(&transactions),
            expense_by_category: compute_expense_by_category(
                &transactions,
                &snapshot.categories,
            ),
            budget_status: compute_budget_status(
                &transactions,
                &snapshot.budgets,
                &snapshot.categories,
                &month,
            ),
            transaction_count: transactions.len(),
            month,
        }
    }
}
