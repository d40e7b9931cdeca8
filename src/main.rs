mod config;
mod db;
mod error;
mod ledger;
mod logging;
mod models;
mod run;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env()?;
    logging::init(&config.log_filter);

    let mut db = db::Database::open(&config.db_path)?;
    run::as_cli(&args, &mut db, &config)
}
