use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::format::{format_amount, progress_bar, truncate};
use crate::config::Config;
use crate::db::Database;
use crate::error::LedgerError;
use crate::ledger::{
    apply_filters, classify_category, parse_budget_amount, resolve_target_month, CategoryFilter,
    CategoryRole, Dashboard, Filters, TypeFilter, ViewConfig, UNCATEGORIZED,
};
use crate::models::{
    parse_date, parse_month, BudgetEntry, Category, CategoryKind, Transaction, TransactionType,
};

pub(crate) fn as_cli(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let Some(command) = args.get(1) else {
        return cli_summary(&[], db, config);
    };
    let rest = &args[2..];
    match command.as_str() {
        "summary" | "s" => cli_summary(rest, db, config),
        "list" | "ls" => cli_list(rest, db, config),
        "add" => cli_add(rest, db),
        "delete" | "rm" => cli_delete(rest, db),
        "categories" => cli_categories(db),
        "category" => cli_add_category(rest, db),
        "budgets" => cli_budgets(rest, db, config),
        "budget" => cli_set_budgets(rest, db),
        "export" => cli_export(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("moneywise {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    let kinds: Vec<String> = TransactionType::all()
        .iter()
        .map(|k| k.as_str().to_lowercase())
        .collect();

    println!("MoneyWise — local personal finance ledger");
    println!();
    println!("Usage: moneywise [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Same as `summary`");
    println!("  summary [YYYY-MM] [filters]     Totals, spending by category and budget status");
    println!("  list [filters]                  List transactions");
    println!(
        "  add <{}> <YYYY-MM-DD> <amount> <category> <description...>",
        kinds.join("|")
    );
    println!("                                  Record a transaction");
    println!("  delete <id>                     Delete a transaction");
    println!("  categories                      List categories");
    println!("  category <name> [--income]      Add a category (expense unless --income)");
    println!("  budgets [YYYY-MM]               Show budgets for a month");
    println!("  budget <YYYY-MM> [<category>=<amount> ...]");
    println!("                                  Replace all budgets for a month");
    println!("  export [path] [filters]         Export transactions to CSV");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Filters:");
    println!("  --from <YYYY-MM-DD>             On or after this date");
    println!("  --to <YYYY-MM-DD>               On or before this date");
    println!("  --type <{}|all>", kinds.join("|"));
    println!("  --category <name|all>");
    println!();
    println!("Environment:");
    println!("  MONEYWISE_DB, MONEYWISE_LOG, MONEYWISE_CURRENCY");
}

// ── Argument helpers ──────────────────────────────────────────

/// Filter flags that take a value.
const VALUE_FLAGS: &[&str] = &["--from", "--to", "--type", "--category"];

/// Value following `flag`. A flag with nothing after it is an error.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    args.get(pos + 1)
        .filter(|v| !v.starts_with("--"))
        .map(|v| Some(v.as_str()))
        .ok_or_else(|| anyhow::anyhow!("Missing value for {flag}"))
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

fn parse_filters(args: &[String], categories: &[Category]) -> Result<Filters> {
    let date_flag = |flag: &str| -> Result<_> {
        flag_value(args, flag)?
            .map(|v| {
                parse_date(v)
                    .ok_or_else(|| anyhow::anyhow!("Invalid date for {flag}: '{v}' (expected YYYY-MM-DD)"))
            })
            .transpose()
    };

    let kind = match flag_value(args, "--type")? {
        Some(v) => TypeFilter::parse(v)
            .ok_or_else(|| anyhow::anyhow!("Invalid --type '{v}' (expected income, expense or all)"))?,
        None => TypeFilter::All,
    };

    let category = match flag_value(args, "--category")? {
        Some(v) if v.eq_ignore_ascii_case("all") => CategoryFilter::All,
        Some(v) => CategoryFilter::Only(find_category(categories, v)?.id.unwrap_or_default()),
        None => CategoryFilter::All,
    };

    Ok(Filters {
        date_from: date_flag("--from")?,
        date_to: date_flag("--to")?,
        kind,
        category,
    })
}

fn parse_month_arg(s: &str) -> Result<String> {
    parse_month(s).ok_or_else(|| LedgerError::InvalidMonth(s.to_string()).into())
}

fn find_category<'a>(categories: &'a [Category], name: &str) -> Result<&'a Category> {
    Category::find_by_name(categories, name)
        .ok_or_else(|| LedgerError::not_found("Category", name).into())
}

fn category_name(categories: &[Category], id: i64) -> &str {
    Category::find_by_id(categories, id)
        .map(|c| c.name.as_str())
        .unwrap_or(UNCATEGORIZED)
}

// ── Commands ──────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let snapshot = db.snapshot()?;
    let view = ViewConfig {
        month: positional(args).map(parse_month_arg).transpose()?,
        filters: parse_filters(args, &snapshot.categories)?,
    };
    let dashboard = Dashboard::build(&snapshot, &view);
    let money = |v: Decimal| format_amount(v, &config.currency_symbol);

    let scope = if view.filters.is_unfiltered() {
        ""
    } else {
        " (filtered)"
    };
    println!("MoneyWise — {}{scope}", dashboard.month);
    println!("{}", "─".repeat(48));
    println!("  Income:     {}", money(dashboard.totals.total_income));
    println!("  Expenses:   {}", money(dashboard.totals.total_expense));
    println!("  Balance:    {}", money(dashboard.totals.balance));
    println!(
        "  Txns:       {} of {}",
        dashboard.transaction_count,
        db.get_transaction_count()?
    );

    if !dashboard.expense_by_category.is_empty() {
        println!();
        println!("Spending by Category:");
        for row in &dashboard.expense_by_category {
            println!("  {:<24} {:>14}", truncate(&row.name, 24), money(row.value));
        }
    }

    if !dashboard.budget_status.is_empty() {
        println!();
        println!("Budgets for {}:", dashboard.month);
        for row in &dashboard.budget_status {
            let percent = row
                .progress_percent()
                .map(|p| format!("{:.0}%", p))
                .unwrap_or_else(|| "—".into());
            println!(
                "  {:<18} {:>12} / {:<12} {} {:>4}",
                truncate(&row.name, 18),
                money(row.spent),
                money(row.budget),
                progress_bar(row.progress_percent(), 20),
                percent,
            );
            if let Some(over) = row.overspend() {
                println!("  {:<18} overspent by {}", "", money(over));
            }
        }
    }

    Ok(())
}

fn cli_list(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let categories = db.get_categories()?;
    let filters = parse_filters(args, &categories)?;
    let txns = apply_filters(&db.get_transactions()?, &filters);
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:<8} {:>14}  {:<16} Description",
        "ID", "Date", "Type", "Amount", "Category"
    );
    println!("{}", "─".repeat(80));
    for txn in &txns {
        println!(
            "{:<6} {:<10} {:<8} {:>14}  {:<16} {}",
            txn.id.unwrap_or(0),
            txn.date.to_string(),
            txn.kind.as_str(),
            format_amount(txn.amount, &config.currency_symbol),
            truncate(category_name(&categories, txn.category_id), 16),
            truncate(&txn.description, 40),
        );
    }
    Ok(())
}

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    let [kind, date, amount, category, description @ ..] = args else {
        anyhow::bail!(
            "Usage: moneywise add <income|expense> <YYYY-MM-DD> <amount> <category> <description...>"
        );
    };
    if description.is_empty() {
        anyhow::bail!("A description is required");
    }

    let kind = TransactionType::parse(kind)
        .ok_or_else(|| anyhow::anyhow!("Invalid type '{kind}' (expected income or expense)"))?;
    let date = parse_date(date)
        .ok_or_else(|| anyhow::anyhow!("Invalid date '{date}' (expected YYYY-MM-DD)"))?;
    let amount = Decimal::from_str(amount.trim())
        .with_context(|| format!("Invalid amount '{amount}'"))?;
    let categories = db.get_categories()?;
    let category_id = find_category(&categories, category)?
        .id
        .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;

    let txn = Transaction::new(kind, amount, date, description.join(" "), category_id);
    let id = db.add_transaction(&txn)?;
    println!("Added {} #{id}", txn.kind.as_str().to_lowercase());
    Ok(())
}

fn cli_delete(args: &[String], db: &mut Database) -> Result<()> {
    let id = positional(args)
        .ok_or_else(|| anyhow::anyhow!("Usage: moneywise delete <id>"))?;
    let id: i64 = id
        .parse()
        .with_context(|| format!("Invalid transaction id '{id}'"))?;
    db.delete_transaction(id)?;
    println!("Deleted transaction #{id}");
    Ok(())
}

fn cli_categories(db: &mut Database) -> Result<()> {
    let categories = db.get_categories()?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }

    println!("{:<4} {:<24} Kind", "ID", "Name");
    println!("{}", "─".repeat(48));
    for cat in &categories {
        let kind = match classify_category(cat) {
            CategoryRole::IncomeCategory => "income",
            CategoryRole::ExpenseCategory => "expense (budgetable)",
        };
        println!("{:<4} {:<24} {kind}", cat.id.unwrap_or(0), cat.name);
    }
    Ok(())
}

fn cli_add_category(args: &[String], db: &mut Database) -> Result<()> {
    let income = args.iter().any(|a| a == "--income");
    let name = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        anyhow::bail!("Usage: moneywise category <name> [--income]");
    }

    let kind = if income {
        CategoryKind::Income
    } else {
        CategoryKind::Expense
    };
    let id = db.add_category(&name, kind)?;
    println!("Added {kind} category '{}' (#{id})", name.trim());
    Ok(())
}

fn cli_budgets(args: &[String], db: &mut Database, config: &Config) -> Result<()> {
    let month = match positional(args) {
        Some(m) => parse_month_arg(m)?,
        None => resolve_target_month(&db.get_transactions()?),
    };
    let categories = db.get_categories()?;
    let budgets = db.get_budgets(Some(&month))?;
    if budgets.is_empty() {
        println!("No budgets for {month}");
        return Ok(());
    }

    println!("Budgets for {month}");
    println!("{}", "─".repeat(40));
    let mut total = Decimal::ZERO;
    for budget in &budgets {
        total += budget.amount;
        println!(
            "  {:<24} {:>12}",
            truncate(category_name(&categories, budget.category_id), 24),
            format_amount(budget.amount, &config.currency_symbol)
        );
    }
    println!(
        "  {:<24} {:>12}",
        "Total",
        format_amount(total, &config.currency_symbol)
    );
    Ok(())
}

fn cli_set_budgets(args: &[String], db: &mut Database) -> Result<()> {
    let Some((month, assignments)) = args.split_first() else {
        anyhow::bail!("Usage: moneywise budget <YYYY-MM> [<category>=<amount> ...]");
    };
    let month = parse_month_arg(month)?;
    let categories = db.get_categories()?;

    let entries = assignments
        .iter()
        .map(|arg| {
            let (name, amount) = arg
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected <category>=<amount>, got '{arg}'"))?;
            let category_id = find_category(&categories, name)?
                .id
                .ok_or_else(|| anyhow::anyhow!("Category has no ID"))?;
            Ok(BudgetEntry::new(category_id, parse_budget_amount(amount)))
        })
        .collect::<Result<Vec<_>>>()?;

    let stored = db.set_budgets_for_month(&entries, &month)?;
    let dropped = entries.len() - stored;
    if dropped > 0 {
        println!("Saved {stored} budgets for {month} ({dropped} zero or duplicate entries dropped)");
    } else {
        println!("Saved {stored} budgets for {month}");
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let categories = db.get_categories()?;
    let filters = parse_filters(args, &categories)?;

    // Output path is the first non-flag argument
    let output_path = positional(args).map(shellexpand).unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/moneywise-export.csv")
    });

    let count = db.export_to_csv(&output_path, &filters)?;
    if count == 0 {
        println!("No transactions to export");
    } else {
        println!("Exported {count} transactions to {output_path}");
    }
    Ok(())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
