#![allow(clippy::unwrap_used)]

use super::*;
use crate::ledger::{compute_budget_status, compute_totals, CategoryFilter, TypeFilter};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn category_id(db: &Database, name: &str) -> i64 {
    let cats = db.get_categories().unwrap();
    Category::find_by_name(&cats, name).and_then(|c| c.id).unwrap()
}

fn make_txn(kind: TransactionType, amount: Decimal, date: &str, category_id: i64) -> Transaction {
    Transaction::new(
        kind,
        amount,
        parse_date(date).unwrap(),
        "Test".into(),
        category_id,
    )
}

fn ledger_error(err: &anyhow::Error) -> &LedgerError {
    err.downcast_ref::<LedgerError>().unwrap()
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_categories_seeded() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.get_categories().unwrap();
    assert!(!cats.is_empty());
    assert!(cats.iter().any(|c| c.name == "Food"));
}

#[test]
fn test_default_income_categories() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.get_categories().unwrap();
    let income: Vec<&str> = cats
        .iter()
        .filter(|c| c.kind == CategoryKind::Income)
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(income, ["Salary", "Freelance"]);
}

#[test]
fn test_default_categories_not_reseeded() {
    let mut db = Database::open_in_memory().unwrap();
    let count_before = db.get_categories().unwrap().len();
    db.seed_default_categories().unwrap();
    let count_after = db.get_categories().unwrap().len();
    assert_eq!(count_before, count_after);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_add_category() {
    let db = Database::open_in_memory().unwrap();
    let id = db.add_category("Investments", CategoryKind::Expense).unwrap();
    let cat = db.get_category_by_id(id).unwrap().unwrap();
    assert_eq!(cat.name, "Investments");
    assert_eq!(cat.kind, CategoryKind::Expense);
}

#[test]
fn test_add_category_trims_name() {
    let db = Database::open_in_memory().unwrap();
    let id = db.add_category("  Pets  ", CategoryKind::Expense).unwrap();
    assert_eq!(db.get_category_by_id(id).unwrap().unwrap().name, "Pets");
}

#[test]
fn test_add_income_category() {
    let db = Database::open_in_memory().unwrap();
    let id = db.add_category("Dividends", CategoryKind::Income).unwrap();
    assert_eq!(
        db.get_category_by_id(id).unwrap().unwrap().kind,
        CategoryKind::Income
    );
}

#[test]
fn test_add_category_duplicate_case_insensitive() {
    let db = Database::open_in_memory().unwrap();
    let before = db.get_categories().unwrap();

    let err = db.add_category("food", CategoryKind::Expense).unwrap_err();
    assert_eq!(
        ledger_error(&err),
        &LedgerError::DuplicateCategory("Food".into())
    );
    let err = db.add_category("  SALARY ", CategoryKind::Income).unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::DuplicateCategory(_)));

    assert_eq!(db.get_categories().unwrap(), before);
}

#[test]
fn test_add_category_blank_rejected() {
    let db = Database::open_in_memory().unwrap();
    let err = db.add_category("   ", CategoryKind::Expense).unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
}

#[test]
fn test_category_by_id_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_category_by_id(99999).unwrap().is_none());
}

#[test]
fn test_categories_in_creation_order() {
    let db = Database::open_in_memory().unwrap();
    db.add_category("Zoo", CategoryKind::Expense).unwrap();
    db.add_category("Aquarium", CategoryKind::Expense).unwrap();
    let cats = db.get_categories().unwrap();
    let tail: Vec<&str> = cats.iter().rev().take(2).map(|c| c.name.as_str()).collect();
    assert_eq!(tail, ["Aquarium", "Zoo"]);
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_transaction_insert_and_query() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let mut txn = make_txn(TransactionType::Expense, dec!(12.34), "2024-05-03", food);
    txn.description = "Lunch".into();
    let id = db.add_transaction(&txn).unwrap();

    let all = db.get_transactions().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, Some(id));
    assert_eq!(all[0].kind, TransactionType::Expense);
    assert_eq!(all[0].amount, dec!(12.34));
    assert_eq!(all[0].date, parse_date("2024-05-03").unwrap());
    assert_eq!(all[0].description, "Lunch");
    assert_eq!(all[0].category_id, food);
}

#[test]
fn test_transaction_ids_are_fresh() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let txn = make_txn(TransactionType::Expense, dec!(1), "2024-05-03", food);
    let a = db.add_transaction(&txn).unwrap();
    let b = db.add_transaction(&txn).unwrap();
    assert_ne!(a, b);
    assert_eq!(db.get_transaction_count().unwrap(), 2);
}

#[test]
fn test_transactions_in_insertion_order() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    for date in ["2024-05-20", "2024-01-01", "2024-03-15"] {
        db.add_transaction(&make_txn(TransactionType::Expense, dec!(1), date, food))
            .unwrap();
    }
    let dates: Vec<String> = db
        .get_transactions()
        .unwrap()
        .iter()
        .map(|t| t.date.to_string())
        .collect();
    assert_eq!(dates, ["2024-05-20", "2024-01-01", "2024-03-15"]);
}

#[test]
fn test_transaction_zero_amount_allowed() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    db.add_transaction(&make_txn(TransactionType::Expense, Decimal::ZERO, "2024-05-03", food))
        .unwrap();
}

#[test]
fn test_transaction_negative_amount_rejected() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let err = db
        .add_transaction(&make_txn(TransactionType::Expense, dec!(-5), "2024-05-03", food))
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
    assert_eq!(db.get_transaction_count().unwrap(), 0);
}

#[test]
fn test_transaction_amount_ceiling() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    db.add_transaction(&make_txn(TransactionType::Expense, MAX_AMOUNT, "2024-05-03", food))
        .unwrap();
    let err = db
        .add_transaction(&make_txn(
            TransactionType::Expense,
            MAX_AMOUNT + dec!(0.01),
            "2024-05-03",
            food,
        ))
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
    assert_eq!(db.get_transaction_count().unwrap(), 1);
}

#[test]
fn test_transaction_blank_description_rejected() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let mut txn = make_txn(TransactionType::Expense, dec!(5), "2024-05-03", food);
    txn.description = "  ".into();
    let err = db.add_transaction(&txn).unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
}

#[test]
fn test_transaction_unknown_category_rejected() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .add_transaction(&make_txn(TransactionType::Expense, dec!(5), "2024-05-03", 4242))
        .unwrap_err();
    assert_eq!(ledger_error(&err), &LedgerError::not_found("Category", 4242));
}

#[test]
fn test_transaction_category_kind_mismatch_rejected() {
    let db = Database::open_in_memory().unwrap();
    let salary = category_id(&db, "Salary");
    let food = category_id(&db, "Food");

    let err = db
        .add_transaction(&make_txn(TransactionType::Expense, dec!(5), "2024-05-03", salary))
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));

    let err = db
        .add_transaction(&make_txn(TransactionType::Income, dec!(5), "2024-05-03", food))
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
}

#[test]
fn test_delete_transaction() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let id = db
        .add_transaction(&make_txn(TransactionType::Expense, dec!(3), "2024-05-03", food))
        .unwrap();
    db.delete_transaction(id).unwrap();
    assert_eq!(db.get_transaction_count().unwrap(), 0);
}

#[test]
fn test_delete_missing_transaction_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    let err = db.delete_transaction(31337).unwrap_err();
    assert_eq!(
        ledger_error(&err),
        &LedgerError::not_found("Transaction", 31337)
    );
}

#[test]
fn test_delete_twice_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let id = db
        .add_transaction(&make_txn(TransactionType::Expense, dec!(3), "2024-05-03", food))
        .unwrap();
    db.delete_transaction(id).unwrap();
    assert!(db.delete_transaction(id).is_err());
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_set_budgets_for_month() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let rent = category_id(&db, "Housing");
    let stored = db
        .set_budgets_for_month(
            &[BudgetEntry::new(food, dec!(150)), BudgetEntry::new(rent, dec!(1200))],
            "2024-05",
        )
        .unwrap();
    assert_eq!(stored, 2);

    let budgets = db.get_budgets(Some("2024-05")).unwrap();
    assert_eq!(budgets.len(), 2);
    assert_eq!(budgets[0].category_id, food);
    assert_eq!(budgets[0].amount, dec!(150));
    assert_eq!(budgets[1].amount, dec!(1200));
}

#[test]
fn test_set_budgets_drops_non_positive() {
    let mut db = Database::open_in_memory().unwrap();
    let a = category_id(&db, "Food");
    let b = category_id(&db, "Transport");
    let c = category_id(&db, "Health");
    db.set_budgets_for_month(
        &[
            BudgetEntry::new(a, dec!(100)),
            BudgetEntry::new(b, dec!(0)),
            BudgetEntry::new(c, dec!(-5)),
        ],
        "2024-05",
    )
    .unwrap();

    let budgets = db.get_budgets(Some("2024-05")).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category_id, a);
    assert_eq!(budgets[0].amount, dec!(100));
}

#[test]
fn test_set_budgets_replaces_whole_month() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let fun = category_id(&db, "Entertainment");
    db.set_budgets_for_month(
        &[BudgetEntry::new(food, dec!(150)), BudgetEntry::new(fun, dec!(80))],
        "2024-05",
    )
    .unwrap();
    db.set_budgets_for_month(&[BudgetEntry::new(food, dec!(175))], "2024-05")
        .unwrap();

    let budgets = db.get_budgets(Some("2024-05")).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category_id, food);
    assert_eq!(budgets[0].amount, dec!(175));
}

#[test]
fn test_set_budgets_empty_clears_only_that_month() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    db.set_budgets_for_month(&[BudgetEntry::new(food, dec!(150))], "2024-05")
        .unwrap();
    db.set_budgets_for_month(&[BudgetEntry::new(food, dec!(160))], "2024-06")
        .unwrap();

    assert_eq!(db.set_budgets_for_month(&[], "2024-05").unwrap(), 0);

    assert!(db.get_budgets(Some("2024-05")).unwrap().is_empty());
    let june = db.get_budgets(Some("2024-06")).unwrap();
    assert_eq!(june.len(), 1);
    assert_eq!(june[0].amount, dec!(160));
    assert_eq!(db.get_budgets(None).unwrap().len(), 1);
}

#[test]
fn test_set_budgets_duplicate_entries_last_wins() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let stored = db
        .set_budgets_for_month(
            &[BudgetEntry::new(food, dec!(100)), BudgetEntry::new(food, dec!(120))],
            "2024-05",
        )
        .unwrap();
    assert_eq!(stored, 1);
    assert_eq!(db.get_budgets(Some("2024-05")).unwrap()[0].amount, dec!(120));
}

#[test]
fn test_set_budgets_amount_ceiling() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let err = db
        .set_budgets_for_month(&[BudgetEntry::new(food, dec!(50000000000000000000))], "2024-05")
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));
    assert!(db.get_budgets(Some("2024-05")).unwrap().is_empty());
}

#[test]
fn test_set_budgets_invalid_month() {
    let mut db = Database::open_in_memory().unwrap();
    let err = db.set_budgets_for_month(&[], "May").unwrap_err();
    assert_eq!(ledger_error(&err), &LedgerError::InvalidMonth("May".into()));
}

#[test]
fn test_set_budgets_income_category_rejected_atomically() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let salary = category_id(&db, "Salary");
    db.set_budgets_for_month(&[BudgetEntry::new(food, dec!(150))], "2024-05")
        .unwrap();

    let err = db
        .set_budgets_for_month(
            &[BudgetEntry::new(food, dec!(10)), BudgetEntry::new(salary, dec!(10))],
            "2024-05",
        )
        .unwrap_err();
    assert!(matches!(ledger_error(&err), LedgerError::Validation(_)));

    // Nothing changed
    let budgets = db.get_budgets(Some("2024-05")).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].amount, dec!(150));
}

#[test]
fn test_set_budgets_unknown_category_rejected() {
    let mut db = Database::open_in_memory().unwrap();
    let err = db
        .set_budgets_for_month(&[BudgetEntry::new(999, dec!(10))], "2024-05")
        .unwrap_err();
    assert_eq!(ledger_error(&err), &LedgerError::not_found("Category", 999));
}

#[test]
fn test_dropped_entries_skip_category_checks() {
    // A zero entry for an income category is dropped before validation
    let mut db = Database::open_in_memory().unwrap();
    let salary = category_id(&db, "Salary");
    let stored = db
        .set_budgets_for_month(&[BudgetEntry::new(salary, Decimal::ZERO)], "2024-05")
        .unwrap();
    assert_eq!(stored, 0);
}

// ── Snapshot ──────────────────────────────────────────────────

#[test]
fn test_snapshot_feeds_engine() {
    let mut db = Database::open_in_memory().unwrap();
    let salary = category_id(&db, "Salary");
    let food = category_id(&db, "Food");
    let transport = category_id(&db, "Transport");

    db.add_transaction(&make_txn(TransactionType::Income, dec!(1000), "2024-05-01", salary))
        .unwrap();
    db.add_transaction(&make_txn(TransactionType::Expense, dec!(200), "2024-05-03", food))
        .unwrap();
    db.add_transaction(&make_txn(TransactionType::Expense, dec!(50), "2024-05-10", transport))
        .unwrap();
    db.set_budgets_for_month(&[BudgetEntry::new(food, dec!(150))], "2024-05")
        .unwrap();

    let snap = db.snapshot().unwrap();
    assert_eq!(snap.transactions.len(), 3);
    assert_eq!(snap.budgets.len(), 1);

    let totals = compute_totals(&snap.transactions);
    assert_eq!(totals.total_income, dec!(1000));
    assert_eq!(totals.total_expense, dec!(250));
    assert_eq!(totals.balance, dec!(750));

    let status =
        compute_budget_status(&snap.transactions, &snap.budgets, &snap.categories, "2024-05");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].name, "Food");
    assert_eq!(status[0].overspend(), Some(dec!(50)));
}

// ── Persistence & migration ───────────────────────────────────

#[test]
fn test_reopen_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moneywise.db");
    {
        let db = Database::open(&path).unwrap();
        db.add_category("Pets", CategoryKind::Expense).unwrap();
    }
    let db = Database::open(&path).unwrap();
    let cats = db.get_categories().unwrap();
    assert!(Category::find_by_name(&cats, "pets").is_some());
    // Seeding did not run twice
    assert_eq!(cats.iter().filter(|c| c.name == "Food").count(), 1);
}

#[test]
fn test_migrate_v1_backfills_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL);
             INSERT INTO schema_version (version) VALUES (1);
             CREATE TABLE categories (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL UNIQUE COLLATE NOCASE
             );
             INSERT INTO categories (name) VALUES ('Salary'), ('Groceries'), ('Freelance');",
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let cats = db.get_categories().unwrap();
    let kind_of = |name: &str| Category::find_by_name(&cats, name).unwrap().kind;
    assert_eq!(kind_of("Salary"), CategoryKind::Income);
    assert_eq!(kind_of("Freelance"), CategoryKind::Income);
    assert_eq!(kind_of("Groceries"), CategoryKind::Expense);

    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_empty_version_table_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");
    {
        let db = Database::open(&path).unwrap();
        db.conn.execute("DELETE FROM schema_version", []).unwrap();
    }
    let err = Database::open(&path).err().unwrap();
    let chain = format!("{err:#}");
    assert!(chain.contains("schema version"), "{chain}");
    assert!(!chain.contains("duplicate column"), "{chain}");
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_to_csv_respects_filters() {
    let db = Database::open_in_memory().unwrap();
    let salary = category_id(&db, "Salary");
    let food = category_id(&db, "Food");
    db.add_transaction(&make_txn(TransactionType::Income, dec!(1000), "2024-05-01", salary))
        .unwrap();
    let mut lunch = make_txn(TransactionType::Expense, dec!(12.50), "2024-05-03", food);
    lunch.description = "Lunch, with friends".into();
    db.add_transaction(&lunch).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let filters = Filters {
        kind: TypeFilter::Only(TransactionType::Expense),
        category: CategoryFilter::All,
        ..Filters::default()
    };
    let count = db.export_to_csv(path.to_str().unwrap(), &filters).unwrap();
    assert_eq!(count, 1);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "2024-05-03");
    assert_eq!(&rows[0][2], "EXPENSE");
    assert_eq!(&rows[0][3], "12.50");
    assert_eq!(&rows[0][4], "Food");
    assert_eq!(&rows[0][5], "Lunch, with friends");
}

#[test]
fn test_export_empty() {
    let db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let count = db
        .export_to_csv(path.to_str().unwrap(), &Filters::default())
        .unwrap();
    assert_eq!(count, 0);
}
