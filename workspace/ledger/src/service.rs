//! The orchestrating service over the ledger core.
//!
//! Writes take already-validated domain drafts (the constructors in
//! `model::domain` are the only way to build one), get friendly existence
//! checks for referenced entities, and then run through the store's
//! serializable unit-of-work. Reads pass straight through to the query and
//! balance modules. Authorization is the caller's concern.

use chrono::NaiveDate;
use common::BalanceReport;
use model::domain::{
    CategoryDraft, GroupDraft, OwnerDraft, OwnerProfile, TransactionDraft, TransactionEdit,
    check_balance,
};
use model::entities::{category, owner, transaction, transaction_group};
use model::entities::transaction::TransactionKind;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::balance;
use crate::error::{LedgerError, Result};
use crate::query::{self, TransactionListing, TransactionQuery};
use crate::retry::RetryPolicy;
use crate::store::LedgerStore;

/// Entry point for everything the ledger backend does.
///
/// Dependencies are passed in here; there is no global state beyond the
/// connection pool inside `db`.
#[derive(Clone)]
pub struct LedgerService {
    db: DatabaseConnection,
    store: LedgerStore,
}

impl LedgerService {
    pub fn new(db: DatabaseConnection, policy: RetryPolicy) -> Self {
        let store = LedgerStore::new(db.clone(), policy);
        Self { db, store }
    }

    // --- ledger rows -----------------------------------------------------

    #[instrument(skip(self, token, draft), fields(owner_id = draft.owner_id))]
    pub async fn create_transaction(
        &self,
        token: &CancellationToken,
        draft: TransactionDraft,
    ) -> Result<transaction::Model> {
        self.ensure_owner(draft.owner_id).await?;
        self.ensure_category(draft.category_id).await?;
        self.ensure_group(draft.group_id).await?;
        let row = self.store.insert_transaction(token, &draft).await?;
        info!(id = row.id, owner_id = row.owner_id, "transaction created");
        Ok(row)
    }

    #[instrument(skip(self, token, edit))]
    pub async fn update_transaction(
        &self,
        token: &CancellationToken,
        id: i32,
        edit: TransactionEdit,
    ) -> Result<transaction::Model> {
        self.ensure_category(edit.category_id).await?;
        self.ensure_group(edit.group_id).await?;
        let row = self.store.update_transaction(token, id, &edit).await?;
        info!(id, "transaction updated");
        Ok(row)
    }

    #[instrument(skip(self, token))]
    pub async fn delete_transaction(&self, token: &CancellationToken, id: i32) -> Result<()> {
        self.store.delete_transaction(token, id).await?;
        info!(id, "transaction deleted");
        Ok(())
    }

    pub async fn get_transaction(&self, id: i32) -> Result<transaction::Model> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::NotFound)
    }

    // --- reads -----------------------------------------------------------

    pub async fn list_all(&self) -> Result<TransactionListing> {
        query::list_all(&self.db).await
    }

    pub async fn list_by_owner(&self, owner_id: i32) -> Result<TransactionListing> {
        query::list_by_owner(&self.db, owner_id).await
    }

    pub async fn list_by_owner_filtered(
        &self,
        owner_id: i32,
        options: &TransactionQuery,
    ) -> Result<TransactionListing> {
        query::list_by_owner_filtered(&self.db, owner_id, options).await
    }

    pub async fn list_by_owner_and_kind(
        &self,
        owner_id: i32,
        kind: TransactionKind,
    ) -> Result<TransactionListing> {
        query::list_by_owner_and_kind(&self.db, owner_id, kind).await
    }

    pub async fn list_by_owner_and_date_range(
        &self,
        owner_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TransactionListing> {
        query::list_by_owner_and_date_range(&self.db, owner_id, from, to).await
    }

    // --- balance ---------------------------------------------------------

    pub async fn get_balance(&self, owner_id: i32) -> Result<BalanceReport> {
        balance::get_balance(&self.db, owner_id).await
    }

    #[instrument(skip(self, token))]
    pub async fn set_initial_balance(
        &self,
        token: &CancellationToken,
        owner_id: i32,
        value: Decimal,
    ) -> Result<owner::Model> {
        let value = check_balance(value).map_err(LedgerError::from)?;
        self.store.set_initial_balance(token, owner_id, value).await
    }

    // --- owners ----------------------------------------------------------

    #[instrument(skip(self, token, draft))]
    pub async fn create_owner(
        &self,
        token: &CancellationToken,
        draft: OwnerDraft,
    ) -> Result<owner::Model> {
        let row = self.store.insert_owner(token, &draft).await?;
        info!(id = row.id, "owner registered");
        Ok(row)
    }

    pub async fn get_owner(&self, id: i32) -> Result<owner::Model> {
        self.store
            .get_owner(id)
            .await?
            .ok_or(LedgerError::OwnerNotFound)
    }

    #[instrument(skip(self, token, profile))]
    pub async fn update_owner_profile(
        &self,
        token: &CancellationToken,
        id: i32,
        profile: OwnerProfile,
    ) -> Result<owner::Model> {
        self.store.update_owner_profile(token, id, &profile).await
    }

    /// Removes the owner together with all their transactions and groups.
    #[instrument(skip(self, token))]
    pub async fn delete_owner(&self, token: &CancellationToken, id: i32) -> Result<()> {
        self.store.delete_owner(token, id).await?;
        info!(id, "owner deleted");
        Ok(())
    }

    // --- categories and groups -------------------------------------------

    #[instrument(skip(self, token, draft))]
    pub async fn create_category(
        &self,
        token: &CancellationToken,
        draft: CategoryDraft,
    ) -> Result<category::Model> {
        self.store.insert_category(token, &draft).await
    }

    pub async fn get_category(&self, id: i32) -> Result<category::Model> {
        self.store
            .get_category(id)
            .await?
            .ok_or(LedgerError::CategoryNotFound)
    }

    /// Fails with `Conflict` while any transaction references the category.
    #[instrument(skip(self, token))]
    pub async fn delete_category(&self, token: &CancellationToken, id: i32) -> Result<()> {
        self.store.delete_category(token, id).await
    }

    #[instrument(skip(self, token, draft), fields(owner_id = draft.owner_id))]
    pub async fn create_group(
        &self,
        token: &CancellationToken,
        draft: GroupDraft,
    ) -> Result<transaction_group::Model> {
        self.ensure_owner(draft.owner_id).await?;
        self.store.insert_group(token, &draft).await
    }

    pub async fn get_group(&self, id: i32) -> Result<transaction_group::Model> {
        self.store
            .get_group(id)
            .await?
            .ok_or(LedgerError::GroupNotFound)
    }

    /// Detaches referencing transactions, then removes the group. Deltas are
    /// untouched.
    #[instrument(skip(self, token))]
    pub async fn delete_group(&self, token: &CancellationToken, id: i32) -> Result<()> {
        self.store.delete_group(token, id).await
    }

    // --- existence pre-checks --------------------------------------------
    //
    // Friendlier than the engine's foreign-key verdict; the store still
    // enforces the references authoritatively inside the unit-of-work.

    async fn ensure_owner(&self, owner_id: i32) -> Result<()> {
        owner::Entity::find_by_id(owner_id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?
            .ok_or(LedgerError::OwnerNotFound)?;
        Ok(())
    }

    async fn ensure_category(&self, category_id: Option<i32>) -> Result<()> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        category::Entity::find_by_id(category_id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?
            .ok_or(LedgerError::CategoryNotFound)?;
        Ok(())
    }

    async fn ensure_group(&self, group_id: Option<i32>) -> Result<()> {
        let Some(group_id) = group_id else {
            return Ok(());
        };
        transaction_group::Entity::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(LedgerError::from)?
            .ok_or(LedgerError::GroupNotFound)?;
        Ok(())
    }
}
