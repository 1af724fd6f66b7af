//! Owner persistence. Deleting an owner cascades to the owner's ledger and
//! groups inside the same unit-of-work.

use chrono::Utc;
use model::domain::{OwnerDraft, OwnerProfile};
use model::entities::owner::{self, Entity as Owner};
use model::entities::transaction::{self, Entity as Transaction};
use model::entities::transaction_group::{self, Entity as TransactionGroup};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};

#[instrument(skip(txn, draft))]
pub(crate) async fn insert(txn: &DatabaseTransaction, draft: &OwnerDraft) -> Result<owner::Model> {
    let now = Utc::now();
    let row = owner::ActiveModel {
        name: Set(draft.name.clone()),
        email: Set(draft.email.clone()),
        password_hash: Set(draft.password_hash.clone()),
        initial_balance: Set(draft.initial_balance),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!(id = row.id, "registered owner");
    Ok(row)
}

#[instrument(skip(txn, profile))]
pub(crate) async fn update_profile(
    txn: &DatabaseTransaction,
    id: i32,
    profile: &OwnerProfile,
) -> Result<owner::Model> {
    let current = Owner::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::OwnerNotFound)?;
    let mut row: owner::ActiveModel = current.into();
    row.name = Set(profile.name.clone());
    row.email = Set(profile.email.clone());
    row.updated_at = Set(Utc::now());
    Ok(row.update(txn).await?)
}

/// Replaces the owner's starting balance. Ledger rows are untouched; the
/// derived current balance shifts uniformly.
#[instrument(skip(txn))]
pub(crate) async fn set_initial_balance(
    txn: &DatabaseTransaction,
    id: i32,
    value: Decimal,
) -> Result<owner::Model> {
    let current = Owner::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::OwnerNotFound)?;
    let mut row: owner::ActiveModel = current.into();
    row.initial_balance = Set(value);
    row.updated_at = Set(Utc::now());
    Ok(row.update(txn).await?)
}

#[instrument(skip(txn))]
pub(crate) async fn delete(txn: &DatabaseTransaction, id: i32) -> Result<()> {
    Owner::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::OwnerNotFound)?;

    // Transactions first so the groups' set-null rule has nothing to touch.
    let transactions = Transaction::delete_many()
        .filter(transaction::Column::OwnerId.eq(id))
        .exec(txn)
        .await?;
    let groups = TransactionGroup::delete_many()
        .filter(transaction_group::Column::OwnerId.eq(id))
        .exec(txn)
        .await?;
    Owner::delete_by_id(id).exec(txn).await?;
    debug!(
        id,
        transactions = transactions.rows_affected,
        groups = groups.rows_affected,
        "deleted owner and cascaded"
    );
    Ok(())
}
