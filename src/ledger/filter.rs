use chrono::NaiveDate;

use crate::models::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(TransactionType),
}

impl TypeFilter {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        TransactionType::parse(s).map(Self::Only)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(i64),
}

/// Transaction list view state. Date bounds are inclusive; `None` leaves that
/// side open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub kind: TypeFilter,
    pub category: CategoryFilter,
}

impl Filters {
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.date_from.map_or(true, |from| txn.date >= from)
            && self.date_to.map_or(true, |to| txn.date <= to)
            && match self.kind {
                TypeFilter::All => true,
                TypeFilter::Only(kind) => txn.kind == kind,
            }
            && match self.category {
                CategoryFilter::All => true,
                CategoryFilter::Only(id) => txn.category_id == id,
            }
    }

    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }
}

/// The transactions passing every filter, in their original order.
pub fn apply_filters(transactions: &[Transaction], filters: &Filters) -> Vec<Transaction> {
    if filters.is_unfiltered() {
        return transactions.to_vec();
    }
    transactions
        .iter()
        .filter(|t| filters.matches(t))
        .cloned()
        .collect()
}
