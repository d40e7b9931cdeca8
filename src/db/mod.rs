mod schema;

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::ledger::{apply_filters, normalize_entries, Filters, Snapshot};
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        debug!(path = %path.display(), "database ready");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .context("Failed to read schema version")?;

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                info!(from_version, "applying schema migration");
                self.conn.execute_batch(sql)?;
            }
        }

        // Tables added after the database was created
        self.conn.execute_batch(schema::SCHEMA)?;

        if current < 2 {
            self.backfill_category_kinds()?;
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    /// Categories created before `kind` existed get the kind their name implied.
    fn backfill_category_kinds(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        let names: Vec<(i64, String)> = {
            let mut stmt = tx.prepare("SELECT id, name FROM categories")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        for (id, name) in &names {
            tx.execute(
                "UPDATE categories SET kind = ?1 WHERE id = ?2",
                params![CategoryKind::from_legacy_name(name).as_str(), id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = [
            "Salary",
            "Freelance",
            "Food",
            "Transport",
            "Housing",
            "Utilities",
            "Entertainment",
            "Health",
            "Shopping",
            "Other",
        ];

        let tx = self.conn.transaction()?;
        for name in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name, kind) VALUES (?1, ?2)",
                params![name, CategoryKind::from_legacy_name(name).as_str()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Everything the engine needs, read inside one transaction so the three
    /// collections agree with each other.
    pub(crate) fn snapshot(&self) -> Result<Snapshot> {
        let tx = self.conn.unchecked_transaction()?;
        let snapshot = Snapshot {
            transactions: query_transactions(&tx)?,
            categories: query_categories(&tx)?,
            budgets: query_budgets(&tx, None)?,
        };
        tx.commit()?;
        Ok(snapshot)
    }

    // ── Transactions ──────────────────────────────────────────

    /// Store a new transaction and return its fresh id.
    pub(crate) fn add_transaction(&self, txn: &Transaction) -> Result<i64> {
        if txn.amount < rust_decimal::Decimal::ZERO {
            warn!(amount = %txn.amount, "rejected negative transaction amount");
            return Err(LedgerError::Validation(format!(
                "amount must not be negative (got {})",
                txn.amount
            ))
            .into());
        }
        if txn.amount > MAX_AMOUNT {
            warn!(amount = %txn.amount, "rejected oversized transaction amount");
            return Err(LedgerError::Validation(format!(
                "amount must not exceed {MAX_AMOUNT} (got {})",
                txn.amount
            ))
            .into());
        }
        if txn.description.trim().is_empty() {
            return Err(LedgerError::Validation("description is required".into()).into());
        }
        let category = self
            .get_category_by_id(txn.category_id)?
            .ok_or_else(|| LedgerError::not_found("Category", txn.category_id))?;
        if !category.accepts(txn.kind) {
            warn!(category = %category.name, kind = %txn.kind, "rejected category/type mismatch");
            return Err(LedgerError::Validation(format!(
                "category '{}' is an {} category and cannot hold {} transactions",
                category.name,
                category.kind.as_str().to_lowercase(),
                txn.kind.as_str().to_lowercase()
            ))
            .into());
        }

        self.conn.execute(
            "INSERT INTO transactions (kind, amount, date, description, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                txn.kind.as_str(),
                txn.amount.to_string(),
                txn.date.to_string(),
                txn.description.trim(),
                txn.category_id,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, kind = %txn.kind, amount = %txn.amount, "added transaction");
        Ok(id)
    }

    /// All transactions in insertion order.
    pub(crate) fn get_transactions(&self) -> Result<Vec<Transaction>> {
        query_transactions(&self.conn)
    }

    pub(crate) fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    pub(crate) fn delete_transaction(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if affected == 0 {
            warn!(id, "delete of unknown transaction");
            return Err(LedgerError::not_found("Transaction", id).into());
        }
        debug!(id, "deleted transaction");
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        query_categories(&self.conn)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name, kind FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a category. Names are unique ignoring case.
    pub(crate) fn add_category(&self, name: &str, kind: CategoryKind) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("category name is required".into()).into());
        }
        let existing = self.get_categories()?;
        if let Some(dup) = Category::find_by_name(&existing, name) {
            warn!(name, existing = %dup.name, "rejected duplicate category");
            return Err(LedgerError::DuplicateCategory(dup.name.clone()).into());
        }

        self.conn.execute(
            "INSERT INTO categories (name, kind) VALUES (?1, ?2)",
            params![name, kind.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name, %kind, "added category");
        Ok(id)
    }

    // ── Budgets ───────────────────────────────────────────────

    /// Budgets for one month, or every month when `month` is `None`.
    pub(crate) fn get_budgets(&self, month: Option<&str>) -> Result<Vec<Budget>> {
        query_budgets(&self.conn, month)
    }

    /// Replace every budget of `month` with `entries` in one step. Non-positive
    /// entries are dropped; categories left out lose their budget for that
    /// month. Returns how many budgets were stored.
    pub(crate) fn set_budgets_for_month(
        &mut self,
        entries: &[BudgetEntry],
        month: &str,
    ) -> Result<usize> {
        let month =
            parse_month(month).ok_or_else(|| LedgerError::InvalidMonth(month.to_string()))?;
        let kept = normalize_entries(entries);

        let categories = self.get_categories()?;
        for entry in &kept {
            let category = Category::find_by_id(&categories, entry.category_id)
                .ok_or_else(|| LedgerError::not_found("Category", entry.category_id))?;
            if entry.amount > MAX_AMOUNT {
                return Err(LedgerError::Validation(format!(
                    "budget for '{}' must not exceed {MAX_AMOUNT} (got {})",
                    category.name, entry.amount
                ))
                .into());
            }
            if !category.is_budgetable() {
                return Err(LedgerError::Validation(format!(
                    "'{}' is an income category and cannot be budgeted",
                    category.name
                ))
                .into());
            }
        }

        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM budgets WHERE month = ?1", params![month])?;
        for entry in &kept {
            tx.execute(
                "INSERT INTO budgets (category_id, month, amount) VALUES (?1, ?2, ?3)",
                params![entry.category_id, month, entry.amount.to_string()],
            )?;
        }
        tx.commit()?;

        info!(
            %month,
            stored = kept.len(),
            dropped = entries.len() - kept.len(),
            removed,
            "replaced budgets for month"
        );
        Ok(kept.len())
    }

    // ── Export ────────────────────────────────────────────────

    /// Write the transactions passing `filters` to a CSV file. Returns the row count.
    pub(crate) fn export_to_csv(&self, path: &str, filters: &Filters) -> Result<usize> {
        let snapshot = self.snapshot()?;
        let rows = apply_filters(&snapshot.transactions, filters);

        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create export file: {path}"))?;
        writer.write_record(["id", "date", "type", "amount", "category", "description"])?;
        for txn in &rows {
            let category = Category::find_by_id(&snapshot.categories, txn.category_id)
                .map(|c| c.name.as_str())
                .unwrap_or(crate::ledger::UNCATEGORIZED);
            writer.write_record([
                txn.id.unwrap_or_default().to_string(),
                txn.date.to_string(),
                txn.kind.as_str().to_string(),
                txn.amount.to_string(),
                category.to_string(),
                txn.description.clone(),
            ])?;
        }
        writer.flush()?;
        info!(rows = rows.len(), path, "exported transactions");
        Ok(rows.len())
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let kind_str: String = row.get(1)?;
    let kind = TransactionType::parse(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown transaction type '{kind_str}'").into(),
        )
    })?;
    Ok(Transaction {
        id: Some(row.get(0)?),
        kind,
        amount: parse_column(row, 2)?,
        date: parse_column(row, 3)?,
        description: row.get(4)?,
        category_id: row.get(5)?,
    })
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    let mut category = Category::new(row.get(1)?, CategoryKind::parse(&row.get::<_, String>(2)?));
    category.id = Some(row.get(0)?);
    Ok(category)
}

fn query_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, amount, date, description, category_id FROM transactions ORDER BY id",
    )?;
    let rows = stmt.query_map([], transaction_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn query_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, kind FROM categories ORDER BY id")?;
    let rows = stmt.query_map([], category_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn budget_from_row(row: &Row) -> rusqlite::Result<Budget> {
    let mut budget = Budget::new(row.get(1)?, row.get(2)?, parse_column(row, 3)?);
    budget.id = Some(row.get(0)?);
    Ok(budget)
}

fn query_budgets(conn: &Connection, month: Option<&str>) -> Result<Vec<Budget>> {
    let budgets = match month {
        Some(m) => {
            let mut stmt = conn.prepare(
                "SELECT id, category_id, month, amount FROM budgets WHERE month = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![m], budget_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt =
                conn.prepare("SELECT id, category_id, month, amount FROM budgets ORDER BY id")?;
            let rows = stmt.query_map([], budget_from_row)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(budgets)
}

#[cfg(test)]
mod tests;
