//! Category persistence. Names are globally unique and deletion is
//! restricted while any transaction references the category.

use model::domain::CategoryDraft;
use model::entities::category::{self, Entity as Category};
use model::entities::transaction::{self, Entity as Transaction};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{debug, instrument, warn};

use crate::error::{LedgerError, Result};

#[instrument(skip(txn, draft))]
pub(crate) async fn insert(
    txn: &DatabaseTransaction,
    draft: &CategoryDraft,
) -> Result<category::Model> {
    let row = category::ActiveModel {
        name: Set(draft.name.clone()),
        description: Set(draft.description.clone()),
        icon: Set(draft.icon.clone()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!(id = row.id, "created category");
    Ok(row)
}

#[instrument(skip(txn))]
pub(crate) async fn delete(txn: &DatabaseTransaction, id: i32) -> Result<()> {
    Category::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::CategoryNotFound)?;

    let referencing = Transaction::find()
        .filter(transaction::Column::CategoryId.eq(id))
        .count(txn)
        .await?;
    if referencing > 0 {
        warn!(id, referencing, "refusing to delete referenced category");
        return Err(LedgerError::Conflict);
    }

    Category::delete_by_id(id).exec(txn).await?;
    Ok(())
}
