use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::ValidationError;

use super::{category, owner, transaction_group};

/// Whether a ledger row moves money into or out of the owner's balance.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "INCOME")]
    Income,
}

impl TransactionKind {
    /// Applies the kind's sign to a positive amount.
    pub fn signed_amount(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Expense => -amount,
            TransactionKind::Income => amount,
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "EXPENSE" => Ok(TransactionKind::Expense),
            "INCOME" => Ok(TransactionKind::Income),
            _ => Err(ValidationError::InvalidKind),
        }
    }
}

/// How a transaction was paid.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "DEBIT_CARD")]
    DebitCard,
    #[sea_orm(string_value = "CREDIT_CARD")]
    CreditCard,
    #[sea_orm(string_value = "BANK_TRANSFER")]
    BankTransfer,
    #[sea_orm(string_value = "MOBILE_PAYMENT")]
    MobilePayment,
    #[sea_orm(string_value = "PAYPAL")]
    Paypal,
    #[sea_orm(string_value = "CRYPTO")]
    Crypto,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "CASH" => Ok(PaymentMethod::Cash),
            "DEBIT_CARD" => Ok(PaymentMethod::DebitCard),
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "MOBILE_PAYMENT" => Ok(PaymentMethod::MobilePayment),
            "PAYPAL" => Ok(PaymentMethod::Paypal),
            "CRYPTO" => Ok(PaymentMethod::Crypto),
            "OTHER" => Ok(PaymentMethod::Other),
            _ => Err(ValidationError::InvalidPaymentMethod),
        }
    }
}

/// A single signed financial event in an owner's ledger.
///
/// Rows of one owner are totally ordered by `(date, created_at, id)`;
/// `cumulative_delta` is the running sum of `signed_amount` over that order
/// up to and including this row. The store repairs it on every mutation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Immutable after creation.
    pub owner_id: i32,
    pub kind: TransactionKind,
    /// Always positive; the sign lives in `kind`.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[serde(with = "common::converters::money")]
    pub amount: Decimal,
    /// `amount` with the kind's sign applied. Derived, never caller-settable.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[serde(with = "common::converters::money")]
    pub signed_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    #[serde(with = "common::converters::money")]
    pub cumulative_delta: Decimal,
    pub date: NaiveDate,
    pub subject: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub category_id: Option<i32>,
    pub group_id: Option<i32>,
    /// Assigned at insert, never changed by updates.
    #[serde(with = "common::converters::timestamp")]
    pub created_at: DateTimeUtc,
    #[serde(with = "common::converters::timestamp")]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "owner::Entity",
        from = "Column::OwnerId",
        to = "owner::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "category::Entity",
        from = "Column::CategoryId",
        to = "category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(
        belongs_to = "transaction_group::Entity",
        from = "Column::GroupId",
        to = "transaction_group::Column::Id",
        on_delete = "SetNull"
    )]
    Group,
}

impl Related<owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<transaction_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
