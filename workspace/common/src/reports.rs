//! Result shapes returned by the ledger's read paths.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of an owner's balance.
///
/// `current_balance` is derived (`initial_balance + cumulative_delta`) and
/// never stored; `cumulative_delta` is taken from the owner's last ledger
/// row, zero for an empty ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    #[serde(with = "crate::converters::money")]
    pub initial_balance: Decimal,
    #[serde(with = "crate::converters::money")]
    pub cumulative_delta: Decimal,
    #[serde(with = "crate::converters::money")]
    pub current_balance: Decimal,
}

/// Aggregates carried with every transaction listing.
///
/// Computed over the returned slice, not the owner's whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub total: u64,
    #[serde(with = "crate::converters::money")]
    pub total_income: Decimal,
    #[serde(with = "crate::converters::money")]
    pub total_expenses: Decimal,
    /// `total_income - total_expenses`.
    #[serde(with = "crate::converters::money")]
    pub net_change: Decimal,
    pub income_count: u64,
    pub expense_count: u64,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::BalanceReport;

    #[test]
    fn balance_report_serializes_money_as_strings() {
        let report = BalanceReport {
            initial_balance: Decimal::from_str("100.005").unwrap(),
            cumulative_delta: Decimal::from_str("-20.5").unwrap(),
            current_balance: Decimal::from_str("79.505").unwrap(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["initial_balance"], "100.00");
        assert_eq!(json["cumulative_delta"], "-20.50");
        assert_eq!(json["current_balance"], "79.50");
    }
}
