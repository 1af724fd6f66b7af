//! Transaction-group persistence. Deleting a group detaches referencing
//! transactions (`group_id` set to null) without touching their deltas.

use chrono::Utc;
use model::domain::GroupDraft;
use model::entities::transaction::{self, Entity as Transaction};
use model::entities::transaction_group::{self, Entity as TransactionGroup};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set, Value,
};
use tracing::{debug, instrument};

use crate::error::{LedgerError, Result};

#[instrument(skip(txn, draft), fields(owner_id = draft.owner_id))]
pub(crate) async fn insert(
    txn: &DatabaseTransaction,
    draft: &GroupDraft,
) -> Result<transaction_group::Model> {
    let row = transaction_group::ActiveModel {
        owner_id: Set(draft.owner_id),
        name: Set(draft.name.clone()),
        description: Set(draft.description.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    debug!(id = row.id, "created transaction group");
    Ok(row)
}

#[instrument(skip(txn))]
pub(crate) async fn delete(txn: &DatabaseTransaction, id: i32) -> Result<()> {
    TransactionGroup::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::GroupNotFound)?;

    let detached = Transaction::update_many()
        .col_expr(transaction::Column::GroupId, Expr::value(Value::Int(None)))
        .col_expr(transaction::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(transaction::Column::GroupId.eq(id))
        .exec(txn)
        .await?;
    TransactionGroup::delete_by_id(id).exec(txn).await?;
    debug!(id, detached = detached.rows_affected, "deleted transaction group");
    Ok(())
}
