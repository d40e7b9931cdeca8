use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::trace;

use super::UNCATEGORIZED;
use crate::models::{month_of, Budget, Category, Transaction};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
}

/// One slice of the expense breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub name: String,
    pub value: Decimal,
}

/// Budget-vs-actual for one category in the target month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetStatus {
    pub name: String,
    pub budget: Decimal,
    pub spent: Decimal,
}

/// Sort key for budget rows. `Unbounded` ranks above every finite ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Usage {
    Ratio(Decimal),
    Unbounded,
}

impl BudgetStatus {
    /// `spent / budget`, with a non-positive budget counting as unbounded
    /// when anything was spent and as zero otherwise.
    pub fn usage(&self) -> Usage {
        if self.budget <= Decimal::ZERO {
            return if self.spent > Decimal::ZERO {
                Usage::Unbounded
            } else {
                Usage::Ratio(Decimal::ZERO)
            };
        }
        self.spent
            .checked_div(self.budget)
            .map_or(Usage::Unbounded, Usage::Ratio)
    }

    /// Progress-bar fill, capped at 100. `None` for a zero budget, which is
    /// drawn in a neutral state.
    pub fn progress_percent(&self) -> Option<Decimal> {
        if self.budget <= Decimal::ZERO {
            return None;
        }
        let pct = self
            .spent
            .checked_div(self.budget)
            .and_then(|r| r.checked_mul(HUNDRED))
            .unwrap_or(HUNDRED);
        Some(pct.min(HUNDRED))
    }

    pub fn is_overspent(&self) -> bool {
        self.spent > self.budget
    }

    /// Amount spent beyond the budget, if any.
    pub fn overspend(&self) -> Option<Decimal> {
        self.is_overspent().then(|| self.spent - self.budget)
    }
}

fn category_names(categories: &[Category]) -> HashMap<i64, &str> {
    categories
        .iter()
        .filter_map(|c| c.id.map(|id| (id, c.name.as_str())))
        .collect()
}

pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();
    for txn in transactions {
        if txn.is_income() {
            totals.total_income += txn.amount;
        } else {
            totals.total_expense += txn.amount;
        }
    }
    totals.balance = totals.total_income - totals.total_expense;
    totals
}

/// Expense totals per category, in order of first appearance. Every
/// unresolvable category id lands in a single "Uncategorized" row.
pub fn compute_expense_by_category(
    transactions: &[Transaction],
    categories: &[Category],
) -> Vec<CategoryTotal> {
    let names = category_names(categories);
    let mut rows: Vec<CategoryTotal> = Vec::new();
    // None is the shared bucket for dangling references
    let mut slots: HashMap<Option<i64>, usize> = HashMap::new();

    for txn in transactions.iter().filter(|t| t.is_expense()) {
        let name = names.get(&txn.category_id).copied();
        let key = name.map(|_| txn.category_id);
        match slots.get(&key) {
            Some(&i) => rows[i].value += txn.amount,
            None => {
                slots.insert(key, rows.len());
                rows.push(CategoryTotal {
                    name: name.unwrap_or(UNCATEGORIZED).to_string(),
                    value: txn.amount,
                });
            }
        }
    }

    trace!(rows = rows.len(), "computed expense breakdown");
    rows
}

/// Month of the most recent transaction, or the current month when there are none.
pub fn resolve_target_month(transactions: &[Transaction]) -> String {
    resolve_target_month_at(transactions, Local::now().date_naive())
}

/// [`resolve_target_month`] with an explicit "today" for the empty fallback.
pub fn resolve_target_month_at(transactions: &[Transaction], today: NaiveDate) -> String {
    let latest = transactions.iter().map(|t| t.date).max();
    let month = month_of(latest.unwrap_or(today));
    trace!(%month, from_activity = latest.is_some(), "resolved target month");
    month
}

/// Budget rows for `month`, most-consumed first.
pub fn compute_budget_status(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    month: &str,
) -> Vec<BudgetStatus> {
    let selected: Vec<&Budget> = budgets.iter().filter(|b| b.month == month).collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let mut spent_by_category: HashMap<i64, Decimal> = HashMap::new();
    for txn in transactions
        .iter()
        .filter(|t| t.is_expense() && t.month() == month)
    {
        *spent_by_category.entry(txn.category_id).or_default() += txn.amount;
    }

    let names = category_names(categories);
    let mut rows: Vec<BudgetStatus> = selected
        .into_iter()
        .map(|b| BudgetStatus {
            name: names
                .get(&b.category_id)
                .copied()
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            budget: b.amount,
            spent: spent_by_category
                .get(&b.category_id)
                .copied()
                .unwrap_or(Decimal::ZERO),
        })
        .collect();

    rows.sort_by(|a, b| b.usage().cmp(&a.usage()));
    trace!(rows = rows.len(), month, "computed budget status");
    rows
}
