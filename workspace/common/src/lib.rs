//! Transport-friendly value types and wire-format helpers shared by the
//! ledger workspace. Nothing in here touches the database.

pub mod converters;
pub mod reports;

pub use reports::{BalanceReport, ListingSummary};
