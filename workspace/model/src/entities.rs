//! This file serves as the root for all SeaORM entity modules.
//! The data model is a per-owner ledger: owners hold transactions, and
//! transactions may reference a shared category and an owner-scoped group.

pub mod category;
pub mod owner;
pub mod transaction;
pub mod transaction_group;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::category::Entity as Category;
    pub use super::owner::Entity as Owner;
    pub use super::transaction::Entity as Transaction;
    pub use super::transaction_group::Entity as TransactionGroup;
}
