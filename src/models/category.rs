use super::TransactionType;

/// Whether a category carries income or expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// Parse a stored kind. Anything unrecognised is an expense category.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "income" => Self::Income,
            _ => Self::Expense,
        }
    }

    /// Kind implied by the historic naming convention, where only "Salary" and
    /// "Freelance" carried income. Used for seeding and for rows migrated
    /// without a stored kind.
    pub fn from_legacy_name(name: &str) -> Self {
        match name {
            "Salary" | "Freelance" => Self::Income,
            _ => Self::Expense,
        }
    }

    /// The transaction type this kind of category accepts.
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Income => TransactionType::Income,
            Self::Expense => TransactionType::Expense,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub kind: CategoryKind,
}

impl Category {
    pub fn new(name: String, kind: CategoryKind) -> Self {
        Self {
            id: None,
            name,
            kind,
        }
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.trim().to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == Some(id))
    }

    /// Categories that can hold a monthly budget.
    pub fn is_budgetable(&self) -> bool {
        self.kind == CategoryKind::Expense
    }

    /// Whether transactions of `kind` may be filed under this category.
    pub fn accepts(&self, kind: TransactionType) -> bool {
        self.kind.transaction_type() == kind
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
