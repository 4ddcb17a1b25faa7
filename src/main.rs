use clap::Parser;
use miette::{IntoDiagnostic, Result};
use purse::application::engine::LedgerEngine;
use purse::domain::ports::{AccountStoreBox, TransactionLogBox};
use purse::infrastructure::in_memory::{InMemoryAccountStore, InMemoryTransactionLog};
use purse::interfaces::console::Console;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    purse::telemetry::init();
    let cli = Cli::parse();

    let engine = build_engine(cli.db_path)?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let mut console = Console::new(Arc::new(engine), stdin, stdout);
    console.run().await.into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn build_engine(db_path: Option<PathBuf>) -> Result<LedgerEngine> {
    if let Some(db_path) = db_path {
        let store = purse::infrastructure::rocksdb::RocksDbStore::open(db_path).into_diagnostic()?;
        let accounts: AccountStoreBox = Box::new(store.clone());
        let log: TransactionLogBox = Box::new(store);
        return Ok(LedgerEngine::new(accounts, log));
    }
    Ok(in_memory_engine())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_engine(db_path: Option<PathBuf>) -> Result<LedgerEngine> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_engine())
}

fn in_memory_engine() -> LedgerEngine {
    let accounts: AccountStoreBox = Box::new(InMemoryAccountStore::new());
    let log: TransactionLogBox = Box::new(InMemoryTransactionLog::new());
    LedgerEngine::new(accounts, log)
}
