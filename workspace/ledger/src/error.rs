//! Error taxonomy of the ledger core and the mapping from storage faults
//! into it.
//!
//! Errors are values: every fallible operation returns `Result<T>`. Engine
//! errors are classified once, here; nothing above the store ever inspects a
//! `DbErr`.

use std::fmt;

use model::domain::ValidationError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

/// Which referenced entity a foreign-key violation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Owner,
    Category,
    Group,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefKind::Owner => "owner",
            RefKind::Category => "category",
            RefKind::Group => "group",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    /// One or more field invariants were violated; never empty.
    #[error("validation failed: {0:?}")]
    Validation(Vec<ValidationError>),
    #[error("transaction not found")]
    NotFound,
    #[error("owner not found")]
    OwnerNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("transaction group not found")]
    GroupNotFound,
    /// Authoritative foreign-key verdict from the storage engine.
    #[error("referenced {0} does not exist")]
    ReferenceNotFound(RefKind),
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("name is already taken")]
    DuplicateName,
    /// Serialization conflict that survived the retry budget, or an entity
    /// state that forbids the operation (e.g. deleting a referenced
    /// category).
    #[error("operation conflicted with concurrent state")]
    Conflict,
    #[error("storage call exceeded its deadline")]
    Timeout,
    #[error("operation was cancelled")]
    Cancelled,
    #[error("storage fault: {0}")]
    StorageFault(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<Vec<ValidationError>> for LedgerError {
    fn from(errors: Vec<ValidationError>) -> Self {
        LedgerError::Validation(errors)
    }
}

impl From<ValidationError> for LedgerError {
    fn from(error: ValidationError) -> Self {
        LedgerError::Validation(vec![error])
    }
}

impl From<DbErr> for LedgerError {
    fn from(err: DbErr) -> Self {
        if matches!(err, DbErr::RecordNotFound(_)) {
            return LedgerError::NotFound;
        }
        let message = err.to_string();
        let lowered = message.to_lowercase();
        if is_serialization_failure(&lowered) {
            return LedgerError::Conflict;
        }
        if is_unique_violation(&lowered) {
            return if lowered.contains("email") {
                LedgerError::DuplicateEmail
            } else {
                LedgerError::DuplicateName
            };
        }
        if lowered.contains("foreign key") {
            if let Some(kind) = referenced_kind(&lowered) {
                return LedgerError::ReferenceNotFound(kind);
            }
        }
        error!("unclassified storage error: {message}");
        LedgerError::StorageFault(message)
    }
}

/// Engine wordings for a serialization failure or lock conflict: SQLSTATE
/// 40001/40P01 on PostgreSQL, SQLITE_BUSY on SQLite.
fn is_serialization_failure(message: &str) -> bool {
    message.contains("could not serialize access")
        || message.contains("serialization failure")
        || message.contains("deadlock detected")
        || message.contains("database is locked")
}

fn is_unique_violation(message: &str) -> bool {
    message.contains("unique constraint") || message.contains("duplicate key")
}

/// PostgreSQL embeds the generated constraint name (which carries the
/// column) in the violation message. SQLite reports foreign-key violations
/// without naming the constraint; those fall through to `StorageFault`,
/// and the service-level existence checks cover the friendly path.
fn referenced_kind(message: &str) -> Option<RefKind> {
    if message.contains("owner_id") {
        Some(RefKind::Owner)
    } else if message.contains("category_id") {
        Some(RefKind::Category)
    } else if message.contains("group_id") {
        Some(RefKind::Group)
    } else {
        None
    }
}
