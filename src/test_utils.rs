//! Fixtures for the end-to-end tests: an in-memory database with the schema
//! derived from the entities, wired into a `LedgerService`.

use ledger::{LedgerService, RetryPolicy};
use model::entities::{category, owner, transaction, transaction_group};
use sea_orm::sea_query::SqliteQueryBuilder;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema, Statement};

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("enable foreign keys");

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
        db.execute(statement).await.expect("create table");
    }
    db
}

pub async fn setup_test_service() -> LedgerService {
    let db = setup_test_db().await;
    LedgerService::new(db, RetryPolicy::default())
}
