//! Transactional persistence with atomic repair of each owner's
//! materialized `cumulative_delta` prefix sums.
//!
//! Every mutation is one serializable unit-of-work; the bulk repairs are
//! single `UPDATE` statements over the affected key range, never row-by-row
//! loops.

pub mod categories;
pub mod groups;
pub mod owners;
pub mod transactions;

use model::domain::{CategoryDraft, GroupDraft, OwnerDraft, OwnerProfile, TransactionDraft, TransactionEdit};
use model::entities::{category, owner, transaction, transaction_group};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio_util::sync::CancellationToken;

use crate::error::{LedgerError, Result};
use crate::retry::{RetryPolicy, run_serializable};

/// Handle over the storage engine for ledger reads and mutations.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct LedgerStore {
    db: DatabaseConnection,
    policy: RetryPolicy,
}

impl LedgerStore {
    pub fn new(db: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    pub async fn insert_transaction(
        &self,
        token: &CancellationToken,
        draft: &TransactionDraft,
    ) -> Result<transaction::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let draft = draft.clone();
            Box::pin(async move { transactions::insert(txn, &draft).await })
        })
        .await
    }

    pub async fn update_transaction(
        &self,
        token: &CancellationToken,
        id: i32,
        edit: &TransactionEdit,
    ) -> Result<transaction::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let edit = edit.clone();
            Box::pin(async move { transactions::update(txn, id, &edit).await })
        })
        .await
    }

    pub async fn delete_transaction(&self, token: &CancellationToken, id: i32) -> Result<()> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            Box::pin(async move { transactions::delete(txn, id).await })
        })
        .await
    }

    pub async fn get_transaction(&self, id: i32) -> Result<Option<transaction::Model>> {
        Ok(transaction::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?)
    }

    pub async fn insert_owner(
        &self,
        token: &CancellationToken,
        draft: &OwnerDraft,
    ) -> Result<owner::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let draft = draft.clone();
            Box::pin(async move { owners::insert(txn, &draft).await })
        })
        .await
    }

    pub async fn update_owner_profile(
        &self,
        token: &CancellationToken,
        id: i32,
        profile: &OwnerProfile,
    ) -> Result<owner::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let profile = profile.clone();
            Box::pin(async move { owners::update_profile(txn, id, &profile).await })
        })
        .await
    }

    pub async fn set_initial_balance(
        &self,
        token: &CancellationToken,
        id: i32,
        value: Decimal,
    ) -> Result<owner::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            Box::pin(async move { owners::set_initial_balance(txn, id, value).await })
        })
        .await
    }

    pub async fn delete_owner(&self, token: &CancellationToken, id: i32) -> Result<()> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            Box::pin(async move { owners::delete(txn, id).await })
        })
        .await
    }

    pub async fn get_owner(&self, id: i32) -> Result<Option<owner::Model>> {
        Ok(owner::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?)
    }

    pub async fn insert_category(
        &self,
        token: &CancellationToken,
        draft: &CategoryDraft,
    ) -> Result<category::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let draft = draft.clone();
            Box::pin(async move { categories::insert(txn, &draft).await })
        })
        .await
    }

    pub async fn delete_category(&self, token: &CancellationToken, id: i32) -> Result<()> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            Box::pin(async move { categories::delete(txn, id).await })
        })
        .await
    }

    pub async fn get_category(&self, id: i32) -> Result<Option<category::Model>> {
        Ok(category::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?)
    }

    pub async fn insert_group(
        &self,
        token: &CancellationToken,
        draft: &GroupDraft,
    ) -> Result<transaction_group::Model> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            let draft = draft.clone();
            Box::pin(async move { groups::insert(txn, &draft).await })
        })
        .await
    }

    pub async fn delete_group(&self, token: &CancellationToken, id: i32) -> Result<()> {
        run_serializable(&self.db, &self.policy, token, |txn| {
            Box::pin(async move { groups::delete(txn, id).await })
        })
        .await
    }

    pub async fn get_group(&self, id: i32) -> Result<Option<transaction_group::Model>> {
        Ok(transaction_group::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?)
    }
}
