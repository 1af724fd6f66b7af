//! Owner balance derivation.
//!
//! The current balance is never stored: it is the owner's `initial_balance`
//! plus the `cumulative_delta` of the last ledger row under the
//! `(date, created_at, id)` ordering, zero for an empty ledger.

use common::BalanceReport;
use model::entities::owner::Entity as Owner;
use model::entities::transaction::{self, Entity as Transaction};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{instrument, trace};

use crate::error::{LedgerError, Result};

#[instrument(skip(db))]
pub(crate) async fn get_balance(db: &DatabaseConnection, owner_id: i32) -> Result<BalanceReport> {
    let owner = Owner::find_by_id(owner_id)
        .one(db)
        .await?
        .ok_or(LedgerError::OwnerNotFound)?;

    let last = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .one(db)
        .await?;
    let cumulative_delta = last
        .map(|row| row.cumulative_delta)
        .unwrap_or(Decimal::ZERO);
    trace!(owner_id, %cumulative_delta, "resolved last ledger row");

    Ok(BalanceReport {
        initial_balance: owner.initial_balance,
        cumulative_delta,
        current_balance: owner.initial_balance + cumulative_delta,
    })
}
