use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::BudgetEntry;

/// Shape a "set budgets for month" request into the records that will be
/// stored: non-positive amounts are dropped, and a category named twice keeps
/// its last amount at its first position.
pub fn normalize_entries(entries: &[BudgetEntry]) -> Vec<BudgetEntry> {
    let mut kept: Vec<BudgetEntry> = Vec::with_capacity(entries.len());
    for entry in entries.iter().filter(|e| e.amount > Decimal::ZERO) {
        match kept.iter_mut().find(|k| k.category_id == entry.category_id) {
            Some(existing) => existing.amount = entry.amount,
            None => kept.push(*entry),
        }
    }
    kept
}

/// Lenient parse for user-entered budget amounts: anything that is not a
/// number becomes zero, so the entry is later dropped by [`normalize_entries`].
pub fn parse_budget_amount(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed).unwrap_or_else(|_| {
        warn!(input = trimmed, "budget amount is not a number, treating as 0");
        Decimal::ZERO
    })
}
