use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Largest amount a single transaction or budget may hold (one quadrillion).
/// Keeps every sum over a ledger far below `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// Parse a stored or user-typed transaction type. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "exp" | "out" => Some(Self::Expense),
            _ => None,
        }
    }

    pub fn all() -> &'static [TransactionType] {
        &[Self::Income, Self::Expense]
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded movement of money. `amount` is never negative; direction lives in `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Option<i64>,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub category_id: i64,
}

impl Transaction {
    pub fn new(
        kind: TransactionType,
        amount: Decimal,
        date: NaiveDate,
        description: String,
        category_id: i64,
    ) -> Self {
        Self {
            id: None,
            kind,
            amount,
            date,
            description,
            category_id,
        }
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// The `YYYY-MM` month this transaction falls in.
    pub fn month(&self) -> String {
        month_of(self.date)
    }
}

/// Format a date as its `YYYY-MM` month key.
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Validate a `YYYY-MM` month key, returning it in canonical zero-padded form.
pub fn parse_month(s: &str) -> Option<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .ok()
        .map(month_of)
}
