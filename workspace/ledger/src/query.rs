//! Filtered, sorted, paginated retrieval over ledger rows.
//!
//! The primary sort key is always `date`; an optional secondary key refines
//! it and `created_at` (then `id`) breaks remaining ties, all in the same
//! direction. Listings carry aggregates computed over the returned slice.

use chrono::NaiveDate;
use common::ListingSummary;
use model::domain::ValidationError;
use model::entities::category;
use model::entities::transaction::{self, Entity as Transaction, TransactionKind};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, Order, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use tracing::{debug, instrument};

use crate::error::Result;

pub const MAX_PAGE_SIZE: u64 = 500;

/// Secondary sort key; the primary key is always `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Subject,
    PaymentMethod,
    Category,
    Amount,
}

/// Optional filters, ordering and pagination for owner listings.
#[derive(Debug, Clone)]
pub struct TransactionQuery {
    /// Case-insensitive substring match on the subject.
    pub subject: Option<String>,
    /// Row's category must be set and in this set (empty = no filter).
    pub category_ids: Vec<i32>,
    /// Row's payment method must be in this set (empty = no filter).
    pub payment_methods: Vec<transaction::PaymentMethod>,
    pub kind: Option<TransactionKind>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<SortBy>,
    pub sort_descending: bool,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            subject: None,
            category_ids: Vec::new(),
            payment_methods: Vec::new(),
            kind: None,
            date_from: None,
            date_to: None,
            sort_by: None,
            sort_descending: true,
            page: None,
            page_size: None,
        }
    }
}

impl TransactionQuery {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if let Some(page_size) = self.page_size {
            if page_size == 0 || page_size > MAX_PAGE_SIZE {
                errors.push(ValidationError::InvalidPageSize);
            }
        }
        if matches!(self.page, Some(0)) {
            errors.push(ValidationError::InvalidPageSize);
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                errors.push(ValidationError::InvalidDateRange);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

/// A slice of ledger rows plus aggregates over that slice.
#[derive(Debug, Clone)]
pub struct TransactionListing {
    pub transactions: Vec<transaction::Model>,
    pub summary: ListingSummary,
}

impl TransactionListing {
    fn new(transactions: Vec<transaction::Model>) -> Self {
        let summary = summarize(&transactions);
        Self {
            transactions,
            summary,
        }
    }
}

fn summarize(rows: &[transaction::Model]) -> ListingSummary {
    let mut summary = ListingSummary {
        total: rows.len() as u64,
        ..ListingSummary::default()
    };
    for row in rows {
        match row.kind {
            TransactionKind::Income => {
                summary.total_income += row.amount;
                summary.income_count += 1;
            }
            TransactionKind::Expense => {
                summary.total_expenses += row.amount;
                summary.expense_count += 1;
            }
        }
    }
    summary.net_change = summary.total_income - summary.total_expenses;
    summary
}

/// Administrative fetch across all owners, newest first.
pub(crate) async fn list_all(db: &DatabaseConnection) -> Result<TransactionListing> {
    let rows = Transaction::find()
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok(TransactionListing::new(rows))
}

pub(crate) async fn list_by_owner(
    db: &DatabaseConnection,
    owner_id: i32,
) -> Result<TransactionListing> {
    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok(TransactionListing::new(rows))
}

pub(crate) async fn list_by_owner_and_kind(
    db: &DatabaseConnection,
    owner_id: i32,
    kind: TransactionKind,
) -> Result<TransactionListing> {
    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::Kind.eq(kind))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok(TransactionListing::new(rows))
}

/// Inclusive on both ends.
pub(crate) async fn list_by_owner_and_date_range(
    db: &DatabaseConnection,
    owner_id: i32,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<TransactionListing> {
    if from > to {
        return Err(vec![ValidationError::InvalidDateRange].into());
    }
    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::Date.gte(from))
        .filter(transaction::Column::Date.lte(to))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    Ok(TransactionListing::new(rows))
}

#[instrument(skip(db, query))]
pub(crate) async fn list_by_owner_filtered(
    db: &DatabaseConnection,
    owner_id: i32,
    query: &TransactionQuery,
) -> Result<TransactionListing> {
    query.validate()?;

    let mut select = Transaction::find().filter(transaction::Column::OwnerId.eq(owner_id));

    if let Some(subject) = &query.subject {
        // lower() both sides; LIKE is case-sensitive on some engines
        let pattern = format!("%{}%", subject.to_lowercase());
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(transaction::Column::Subject))).like(pattern),
        );
    }
    if !query.category_ids.is_empty() {
        select = select.filter(transaction::Column::CategoryId.is_in(query.category_ids.clone()));
    }
    if !query.payment_methods.is_empty() {
        select = select
            .filter(transaction::Column::PaymentMethod.is_in(query.payment_methods.clone()));
    }
    if let Some(kind) = query.kind {
        select = select.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(from) = query.date_from {
        select = select.filter(transaction::Column::Date.gte(from));
    }
    if let Some(to) = query.date_to {
        select = select.filter(transaction::Column::Date.lte(to));
    }

    let order = if query.sort_descending {
        Order::Desc
    } else {
        Order::Asc
    };
    select = select.order_by(transaction::Column::Date, order.clone());
    match query.sort_by {
        Some(SortBy::Subject) => {
            select = select.order_by(transaction::Column::Subject, order.clone());
        }
        Some(SortBy::PaymentMethod) => {
            select = select.order_by(transaction::Column::PaymentMethod, order.clone());
        }
        Some(SortBy::Category) => {
            select = select
                .join(JoinType::LeftJoin, transaction::Relation::Category.def())
                .order_by(category::Column::Name, order.clone());
        }
        Some(SortBy::Amount) => {
            select = select.order_by(transaction::Column::Amount, order.clone());
        }
        None => {}
    }
    select = select
        .order_by(transaction::Column::CreatedAt, order.clone())
        .order_by(transaction::Column::Id, order);

    if let Some(page_size) = query.page_size {
        let page = query.page.unwrap_or(1);
        select = select.offset((page - 1) * page_size).limit(page_size);
    }

    let rows = select.all(db).await?;
    debug!(owner_id, matched = rows.len(), "filtered listing");
    Ok(TransactionListing::new(rows))
}
