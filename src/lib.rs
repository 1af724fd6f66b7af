//! finledger: a personal-finance backend core built around a per-owner
//! ordered ledger with materialized running balances.
//!
//! This crate wires configuration and the database connection into the
//! [`LedgerService`]; the interesting machinery lives in the `ledger`
//! workspace crate.

pub mod config;

use anyhow::Result;
use sea_orm::Database;

pub use config::Settings;
pub use ledger::{
    LedgerError, LedgerService, RetryPolicy, SortBy, TransactionListing, TransactionQuery,
};

/// Initialize the tracing subscriber with a default configuration.
/// The log level can be controlled via the RUST_LOG environment variable.
#[cfg(not(test))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt::format::FmtSpan;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_span_events(FmtSpan::CLOSE)
        .init();
}

/// Connects to the storage engine and builds the ledger service from the
/// given settings.
pub async fn init_service(settings: &Settings) -> Result<LedgerService> {
    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;
    Ok(LedgerService::new(db, settings.retry_policy()))
}

#[cfg(test)]
mod test_utils;
