//! Shared fixtures for the ledger tests: an in-memory SQLite database with
//! the schema derived from the entities, builders for owners and drafts,
//! and the invariant assertions the scenario tests lean on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use model::domain::{TransactionDraft, TransactionEdit};
use model::entities::transaction::{self, PaymentMethod, TransactionKind};
use model::entities::{category, owner, transaction_group};
use rust_decimal::Decimal;
use sea_orm::sea_query::SqliteQueryBuilder;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, Order, QueryFilter, QueryOrder, Schema, Set, Statement,
};

use crate::retry::RetryPolicy;
use crate::service::LedgerService;
use crate::store::LedgerStore;

/// In-memory SQLite with the schema derived from the entity definitions and
/// foreign keys enabled.
pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    let schema = Schema::new(DbBackend::Sqlite);
    let tables = [
        schema.create_table_from_entity(owner::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(transaction_group::Entity),
        schema.create_table_from_entity(transaction::Entity),
    ];
    for table in tables {
        let statement =
            Statement::from_string(DbBackend::Sqlite, table.to_string(SqliteQueryBuilder));
        db.execute(statement).await?;
    }
    Ok(db)
}

/// Store with a retry policy fast enough for tests.
pub fn test_store(db: &DatabaseConnection) -> LedgerStore {
    LedgerStore::new(db.clone(), test_policy())
}

pub fn test_service(db: &DatabaseConnection) -> LedgerService {
    LedgerService::new(db.clone(), test_policy())
}

fn test_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

pub async fn new_owner(
    db: &DatabaseConnection,
    initial_balance: Decimal,
) -> Result<owner::Model, DbErr> {
    static OWNER_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = OWNER_SEQ.fetch_add(1, Ordering::SeqCst);
    let now = Utc::now();
    owner::ActiveModel {
        name: Set(format!("Owner {seq}")),
        email: Set(format!("owner{seq}@example.com")),
        password_hash: Set("opaque-hash".to_string()),
        initial_balance: Set(initial_balance),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_category(db: &DatabaseConnection, name: &str) -> Result<category::Model, DbErr> {
    category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        icon: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_group(
    db: &DatabaseConnection,
    owner_id: i32,
    name: &str,
) -> Result<transaction_group::Model, DbErr> {
    transaction_group::ActiveModel {
        owner_id: Set(owner_id),
        name: Set(name.to_string()),
        description: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub fn income(owner_id: i32, amount: i64, date: NaiveDate) -> TransactionDraft {
    draft(owner_id, TransactionKind::Income, amount, date)
}

pub fn expense(owner_id: i32, amount: i64, date: NaiveDate) -> TransactionDraft {
    draft(owner_id, TransactionKind::Expense, amount, date)
}

fn draft(owner_id: i32, kind: TransactionKind, amount: i64, date: NaiveDate) -> TransactionDraft {
    TransactionDraft::new(
        owner_id,
        kind,
        Decimal::from(amount),
        date,
        "fixture",
        None,
        PaymentMethod::Cash,
        None,
        None,
    )
    .expect("fixture draft is valid")
}

/// Replacement edit carrying the row's current fields except for the given
/// kind, amount and date.
pub fn edit_from(
    row: &transaction::Model,
    kind: TransactionKind,
    amount: i64,
    date: NaiveDate,
) -> TransactionEdit {
    TransactionEdit::new(
        kind,
        Decimal::from(amount),
        date,
        &row.subject,
        row.notes.as_deref(),
        row.payment_method,
        row.category_id,
        row.group_id,
    )
    .expect("fixture edit is valid")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("fixture date is valid")
}

/// The owner's rows in ledger order: `(date, created_at, id)` ascending.
pub async fn ordered_rows(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<Vec<transaction::Model>, DbErr> {
    transaction::Entity::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .order_by(transaction::Column::Date, Order::Asc)
        .order_by(transaction::Column::CreatedAt, Order::Asc)
        .order_by(transaction::Column::Id, Order::Asc)
        .all(db)
        .await
}

/// Asserts the universal ledger invariants for one owner: prefix sums,
/// the sign rule, ownership, and the derived current balance.
pub async fn assert_ledger_invariants(db: &DatabaseConnection, owner: &owner::Model) {
    let rows = ordered_rows(db, owner.id).await.unwrap();
    let mut running = Decimal::ZERO;
    for row in &rows {
        assert!(row.amount > Decimal::ZERO, "row {} amount not positive", row.id);
        assert_eq!(
            row.signed_amount,
            row.kind.signed_amount(row.amount),
            "row {} breaks the sign rule",
            row.id
        );
        assert_eq!(row.owner_id, owner.id);
        running += row.signed_amount;
        assert_eq!(
            row.cumulative_delta, running,
            "row {} breaks the prefix-sum invariant",
            row.id
        );
    }

    let report = crate::balance::get_balance(db, owner.id).await.unwrap();
    assert_eq!(report.cumulative_delta, running);
    assert_eq!(report.current_balance, owner.initial_balance + running);
}

/// Convenience view for asserting whole-ledger states:
/// `(id, signed_amount, cumulative_delta)` in ledger order.
pub async fn ledger_shape(db: &DatabaseConnection, owner_id: i32) -> Vec<(i32, i64, i64)> {
    use rust_decimal::prelude::ToPrimitive;

    ordered_rows(db, owner_id)
        .await
        .unwrap()
        .iter()
        .map(|row| {
            (
                row.id,
                row.signed_amount.to_i64().expect("integral fixture"),
                row.cumulative_delta.to_i64().expect("integral fixture"),
            )
        })
        .collect()
}
