use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: Option<i64>,
    pub category_id: i64,
    /// Format: "YYYY-MM"
    pub month: String,
    pub amount: Decimal,
}

impl Budget {
    pub fn new(category_id: i64, month: String, amount: Decimal) -> Self {
        Self {
            id: None,
            category_id,
            month,
            amount,
        }
    }
}

/// One line of a "set budgets for month" request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetEntry {
    pub category_id: i64,
    pub amount: Decimal,
}

impl BudgetEntry {
    pub fn new(category_id: i64, amount: Decimal) -> Self {
        Self {
            category_id,
            amount,
        }
    }
}
