use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The principal that owns a ledger.
///
/// `initial_balance` is the starting point of the derived current balance;
/// it is never folded into the ledger rows themselves.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "owners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Stored lowercase; uniqueness is enforced by the storage engine.
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque to this system; hashing happens upstream.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[serde(with = "common::converters::money")]
    pub initial_balance: Decimal,
    #[serde(with = "common::converters::timestamp")]
    pub created_at: DateTimeUtc,
    #[serde(with = "common::converters::timestamp")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // An owner's transactions and groups die with the owner.
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transaction,
    #[sea_orm(has_many = "super::transaction_group::Entity")]
    TransactionGroup,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<super::transaction_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
