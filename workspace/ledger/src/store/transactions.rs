//! Ledger-row mutations and the prefix-sum repair that keeps every owner's
//! `cumulative_delta` column equal to the running sum of signed amounts.
//!
//! Rows of one owner are totally ordered by `(date, created_at, id)`. A
//! mutation only ever shifts contiguous key ranges, so each repair is a
//! single bulk `UPDATE` over a range plus at most one point read.

use chrono::{DateTime, NaiveDate, Utc};
use model::domain::{TransactionDraft, TransactionEdit};
use model::entities::transaction::{self, Entity as Transaction};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, instrument, trace};

use crate::error::{LedgerError, Result};

/// Position of a row in its owner's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct OrderingKey {
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub id: i32,
}

impl OrderingKey {
    pub fn of(row: &transaction::Model) -> Self {
        Self {
            date: row.date,
            created_at: row.created_at,
            id: row.id,
        }
    }

    /// Rows strictly after this key.
    fn strictly_after(&self) -> Condition {
        Condition::any()
            .add(transaction::Column::Date.gt(self.date))
            .add(
                Condition::all()
                    .add(transaction::Column::Date.eq(self.date))
                    .add(transaction::Column::CreatedAt.gt(self.created_at)),
            )
            .add(
                Condition::all()
                    .add(transaction::Column::Date.eq(self.date))
                    .add(transaction::Column::CreatedAt.eq(self.created_at))
                    .add(transaction::Column::Id.gt(self.id)),
            )
    }

    /// Rows strictly before this key.
    fn strictly_before(&self) -> Condition {
        Condition::any()
            .add(transaction::Column::Date.lt(self.date))
            .add(
                Condition::all()
                    .add(transaction::Column::Date.eq(self.date))
                    .add(transaction::Column::CreatedAt.lt(self.created_at)),
            )
            .add(
                Condition::all()
                    .add(transaction::Column::Date.eq(self.date))
                    .add(transaction::Column::CreatedAt.eq(self.created_at))
                    .add(transaction::Column::Id.lt(self.id)),
            )
    }
}

/// Rows strictly between `lower` and `upper`.
fn between(lower: &OrderingKey, upper: &OrderingKey) -> Condition {
    Condition::all()
        .add(lower.strictly_after())
        .add(upper.strictly_before())
}

#[instrument(skip(txn, draft), fields(owner_id = draft.owner_id, date = %draft.date))]
pub(crate) async fn insert(
    txn: &DatabaseTransaction,
    draft: &TransactionDraft,
) -> Result<transaction::Model> {
    let now = Utc::now();
    let signed_amount = draft.kind.signed_amount(draft.amount);

    // Existing rows on the same date all predate `now` (or tie with a
    // smaller id), so the rightmost predecessor is found with `<=`.
    let previous = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(draft.owner_id))
        .filter(
            Condition::any()
                .add(transaction::Column::Date.lt(draft.date))
                .add(
                    Condition::all()
                        .add(transaction::Column::Date.eq(draft.date))
                        .add(transaction::Column::CreatedAt.lte(now)),
                ),
        )
        .order_by(transaction::Column::Date, Order::Desc)
        .order_by(transaction::Column::CreatedAt, Order::Desc)
        .order_by(transaction::Column::Id, Order::Desc)
        .one(txn)
        .await?;
    let previous_cumulative = previous
        .map(|row| row.cumulative_delta)
        .unwrap_or(Decimal::ZERO);
    trace!(%previous_cumulative, "resolved predecessor for insert");

    let row = transaction::ActiveModel {
        owner_id: Set(draft.owner_id),
        kind: Set(draft.kind),
        amount: Set(draft.amount),
        signed_amount: Set(signed_amount),
        cumulative_delta: Set(previous_cumulative + signed_amount),
        date: Set(draft.date),
        subject: Set(draft.subject.clone()),
        notes: Set(draft.notes.clone()),
        payment_method: Set(draft.payment_method),
        category_id: Set(draft.category_id),
        group_id: Set(draft.group_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let repaired = shift_rows(
        txn,
        row.owner_id,
        OrderingKey::of(&row).strictly_after(),
        signed_amount,
        now,
    )
    .await?;
    debug!(id = row.id, repaired, "inserted ledger row");
    Ok(row)
}

#[instrument(skip(txn, edit))]
pub(crate) async fn update(
    txn: &DatabaseTransaction,
    id: i32,
    edit: &TransactionEdit,
) -> Result<transaction::Model> {
    let old = Transaction::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::NotFound)?;

    let now = Utc::now();
    let new_signed = edit.kind.signed_amount(edit.amount);
    let delta = new_signed - old.signed_amount;
    let old_key = OrderingKey::of(&old);
    let new_key = OrderingKey {
        date: edit.date,
        ..old_key
    };

    let cumulative_delta = if new_key == old_key {
        // The row keeps its position; only the tail past it shifts.
        shift_rows(txn, old.owner_id, old_key.strictly_after(), delta, now).await?;
        old.cumulative_delta + delta
    } else {
        if new_key > old_key {
            // Forward move: rows the row jumped over stop counting its old
            // amount; rows past the destination swap old for new.
            shift_rows(
                txn,
                old.owner_id,
                between(&old_key, &new_key),
                -old.signed_amount,
                now,
            )
            .await?;
            shift_rows(txn, old.owner_id, new_key.strictly_after(), delta, now).await?;
        } else {
            // Backward move: rows the row jumped over start counting its new
            // amount; rows past the origin swap old for new.
            shift_rows(
                txn,
                old.owner_id,
                between(&new_key, &old_key),
                new_signed,
                now,
            )
            .await?;
            shift_rows(txn, old.owner_id, old_key.strictly_after(), delta, now).await?;
        }
        previous_cumulative(txn, old.owner_id, &new_key).await? + new_signed
    };

    // `owner_id` and `created_at` stay untouched on the active model.
    let mut row: transaction::ActiveModel = old.into();
    row.kind = Set(edit.kind);
    row.amount = Set(edit.amount);
    row.signed_amount = Set(new_signed);
    row.cumulative_delta = Set(cumulative_delta);
    row.date = Set(edit.date);
    row.subject = Set(edit.subject.clone());
    row.notes = Set(edit.notes.clone());
    row.payment_method = Set(edit.payment_method);
    row.category_id = Set(edit.category_id);
    row.group_id = Set(edit.group_id);
    row.updated_at = Set(now);
    let updated = row.update(txn).await?;
    debug!(id = updated.id, %delta, "updated ledger row");
    Ok(updated)
}

#[instrument(skip(txn))]
pub(crate) async fn delete(txn: &DatabaseTransaction, id: i32) -> Result<()> {
    let row = Transaction::find_by_id(id)
        .one(txn)
        .await?
        .ok_or(LedgerError::NotFound)?;

    let key = OrderingKey::of(&row);
    Transaction::delete_by_id(id).exec(txn).await?;
    let repaired = shift_rows(
        txn,
        row.owner_id,
        key.strictly_after(),
        -row.signed_amount,
        Utc::now(),
    )
    .await?;
    debug!(id, repaired, "deleted ledger row");
    Ok(())
}

/// The `cumulative_delta` of the rightmost row (other than `key.id`) before
/// `key`, zero when the key has no predecessor.
async fn previous_cumulative(
    txn: &DatabaseTransaction,
    owner_id: i32,
    key: &OrderingKey,
) -> Result<Decimal> {
    let previous = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(transaction::Column::Id.ne(key.id))
        .filter(key.strictly_before())
        .order_by(transaction::Column::Date, Order::Desc)
        .order_by(transaction::Column::CreatedAt, Order::Desc)
        .order_by(transaction::Column::Id, Order::Desc)
        .one(txn)
        .await?;
    Ok(previous
        .map(|row| row.cumulative_delta)
        .unwrap_or(Decimal::ZERO))
}

/// Adds `delta` to `cumulative_delta` of every row of `owner_id` within
/// `scope`, refreshing `updated_at`. One statement; returns the number of
/// repaired rows.
async fn shift_rows(
    txn: &DatabaseTransaction,
    owner_id: i32,
    scope: Condition,
    delta: Decimal,
    now: DateTime<Utc>,
) -> Result<u64> {
    if delta.is_zero() {
        return Ok(0);
    }
    let result = Transaction::update_many()
        .col_expr(
            transaction::Column::CumulativeDelta,
            Expr::col(transaction::Column::CumulativeDelta).add(delta),
        )
        .col_expr(transaction::Column::UpdatedAt, Expr::value(now))
        .filter(transaction::Column::OwnerId.eq(owner_id))
        .filter(scope)
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use model::domain::{TransactionDraft, TransactionEdit};
    use model::entities::transaction::{PaymentMethod, TransactionKind};
    use rust_decimal::Decimal;
    use tokio_util::sync::CancellationToken;

    use crate::error::LedgerError;
    use crate::store::LedgerStore;
    use crate::testing::{
        assert_ledger_invariants, date, edit_from, expense, income, ledger_shape, new_owner,
        ordered_rows, setup_db, test_store,
    };

    /// The reference ledger: signed amounts
    /// `+3500, -50, -60, -1200, +500, -350, +1000` in insertion order.
    fn reference_drafts(owner_id: i32, dates: &[NaiveDate]) -> Vec<TransactionDraft> {
        let amounts: [(TransactionKind, i64); 7] = [
            (TransactionKind::Income, 3500),
            (TransactionKind::Expense, 50),
            (TransactionKind::Expense, 60),
            (TransactionKind::Expense, 1200),
            (TransactionKind::Income, 500),
            (TransactionKind::Expense, 350),
            (TransactionKind::Income, 1000),
        ];
        amounts
            .iter()
            .zip(dates)
            .map(|(&(kind, amount), &day)| match kind {
                TransactionKind::Income => income(owner_id, amount, day),
                TransactionKind::Expense => expense(owner_id, amount, day),
            })
            .collect()
    }

    async fn seed(
        store: &LedgerStore,
        token: &CancellationToken,
        drafts: Vec<TransactionDraft>,
    ) -> Vec<i32> {
        let mut ids = Vec::new();
        for draft in drafts {
            let row = store.insert_transaction(token, &draft).await.unwrap();
            ids.push(row.id);
        }
        ids
    }

    fn same_day(count: usize) -> Vec<NaiveDate> {
        vec![date(2024, 11, 15); count]
    }

    fn spaced_days() -> Vec<NaiveDate> {
        (10..=16).map(|day| date(2024, 11, day)).collect()
    }

    fn cumulative(shape: &[(i32, i64, i64)]) -> Vec<i64> {
        shape.iter().map(|&(_, _, cumulative)| cumulative).collect()
    }

    fn order(shape: &[(i32, i64, i64)]) -> Vec<i32> {
        shape.iter().map(|&(id, _, _)| id).collect()
    }

    #[tokio::test]
    async fn sequential_inserts_on_one_date_accumulate() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        seed(&store, &token, reference_drafts(owner.id, &same_day(7))).await;

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(cumulative(&shape), [3500, 3450, 3390, 2190, 2690, 2340, 3340]);

        let report = crate::balance::get_balance(&db, owner.id).await.unwrap();
        assert_eq!(report.initial_balance, Decimal::ZERO);
        assert_eq!(report.cumulative_delta, Decimal::from(3340));
        assert_eq!(report.current_balance, Decimal::from(3340));
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn out_of_order_insert_repairs_the_tail() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let a = store
            .insert_transaction(&token, &income(owner.id, 100, date(2024, 11, 10)))
            .await
            .unwrap();
        let b = store
            .insert_transaction(&token, &income(owner.id, 30, date(2024, 11, 5)))
            .await
            .unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(shape, [(b.id, 30, 30), (a.id, 100, 130)]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn amount_edit_on_same_date_shifts_the_tail() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &same_day(7))).await;
        let before = ordered_rows(&db, owner.id).await.unwrap();

        let target = store.get_transaction(ids[2]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Expense, 90, target.date);
        store.update_transaction(&token, ids[2], &edit).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(cumulative(&shape), [3500, 3450, 3360, 2160, 2660, 2310, 3310]);

        let after = ordered_rows(&db, owner.id).await.unwrap();
        for (was, now) in before.iter().zip(&after) {
            assert_eq!(was.created_at, now.created_at);
            if was.id == ids[0] || was.id == ids[1] {
                assert_eq!(was.updated_at, now.updated_at, "untouched prefix row changed");
            } else {
                assert!(now.updated_at > was.updated_at, "repaired row kept stale updated_at");
            }
        }
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn forward_date_move_lands_before_newer_rows_on_that_date() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &spaced_days())).await;

        // move the -50 row from Nov 11 to Nov 15; its older created_at puts
        // it ahead of the -350 row already living there
        let target = store.get_transaction(ids[1]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Expense, 50, date(2024, 11, 15));
        store.update_transaction(&token, ids[1], &edit).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(
            order(&shape),
            [ids[0], ids[2], ids[3], ids[4], ids[1], ids[5], ids[6]]
        );
        assert_eq!(cumulative(&shape), [3500, 3440, 2240, 2740, 2690, 2340, 3340]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn backward_date_move_to_the_front() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &same_day(7))).await;

        let target = store.get_transaction(ids[6]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Income, 1000, date(2024, 11, 10));
        store.update_transaction(&token, ids[6], &edit).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(
            order(&shape),
            [ids[6], ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]]
        );
        assert_eq!(cumulative(&shape), [1000, 4500, 4450, 4390, 3190, 3690, 3340]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn backward_move_with_amount_change() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &spaced_days())).await;

        // -350 on Nov 15 becomes +200 on Nov 11, behind the row already there
        let target = store.get_transaction(ids[5]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Income, 200, date(2024, 11, 11));
        store.update_transaction(&token, ids[5], &edit).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(
            order(&shape),
            [ids[0], ids[1], ids[5], ids[2], ids[3], ids[4], ids[6]]
        );
        assert_eq!(cumulative(&shape), [3500, 3450, 3650, 3590, 2390, 2890, 3890]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn forward_move_with_amount_change() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &spaced_days())).await;

        // -50 on Nov 11 becomes -75 on Nov 16, ahead of the newer row there
        let target = store.get_transaction(ids[1]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Expense, 75, date(2024, 11, 16));
        store.update_transaction(&token, ids[1], &edit).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(
            order(&shape),
            [ids[0], ids[2], ids[3], ids[4], ids[5], ids[1], ids[6]]
        );
        assert_eq!(cumulative(&shape), [3500, 3440, 2240, 2740, 2390, 2315, 3315]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn delete_in_the_middle_lifts_the_tail() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &same_day(7))).await;
        store.delete_transaction(&token, ids[3]).await.unwrap();

        let shape = ledger_shape(&db, owner.id).await;
        assert_eq!(cumulative(&shape), [3500, 3450, 3390, 3890, 3540, 4540]);
        assert_ledger_invariants(&db, &owner).await;
    }

    #[tokio::test]
    async fn inserts_then_deletes_round_trip_to_the_initial_balance() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::from(250)).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(owner.id, &spaced_days())).await;
        for index in [3usize, 0, 6, 2, 5, 1, 4] {
            store.delete_transaction(&token, ids[index]).await.unwrap();
            assert_ledger_invariants(&db, &owner).await;
        }

        assert!(ordered_rows(&db, owner.id).await.unwrap().is_empty());
        let report = crate::balance::get_balance(&db, owner.id).await.unwrap();
        assert_eq!(report.current_balance, Decimal::from(250));
    }

    #[tokio::test]
    async fn update_preserves_owner_and_creation_time() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let row = store
            .insert_transaction(&token, &income(owner.id, 10, date(2024, 11, 15)))
            .await
            .unwrap();
        let edit = edit_from(&row, TransactionKind::Expense, 20, date(2024, 12, 1));
        let updated = store.update_transaction(&token, row.id, &edit).await.unwrap();

        assert_eq!(updated.owner_id, row.owner_id);
        assert_eq!(updated.created_at, row.created_at);
        assert!(updated.updated_at > row.updated_at);
        assert_eq!(updated.signed_amount, Decimal::from(-20));
    }

    #[tokio::test]
    async fn missing_rows_surface_not_found() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let owner = new_owner(&db, Decimal::ZERO).await.unwrap();

        let row = store
            .insert_transaction(&token, &income(owner.id, 10, date(2024, 11, 15)))
            .await
            .unwrap();
        let edit = edit_from(&row, TransactionKind::Income, 10, row.date);

        assert!(matches!(
            store.update_transaction(&token, row.id + 999, &edit).await,
            Err(LedgerError::NotFound)
        ));
        assert!(matches!(
            store.delete_transaction(&token, row.id + 999).await,
            Err(LedgerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn mutations_never_touch_other_owners() {
        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let alice = new_owner(&db, Decimal::ZERO).await.unwrap();
        let bob = new_owner(&db, Decimal::ZERO).await.unwrap();

        seed(&store, &token, reference_drafts(bob.id, &same_day(7))).await;
        let bob_before = ordered_rows(&db, bob.id).await.unwrap();

        let ids = seed(&store, &token, reference_drafts(alice.id, &spaced_days())).await;
        let target = store.get_transaction(ids[2]).await.unwrap().unwrap();
        let edit = edit_from(&target, TransactionKind::Income, 75, date(2024, 11, 16));
        store.update_transaction(&token, ids[2], &edit).await.unwrap();
        store.delete_transaction(&token, ids[0]).await.unwrap();

        let bob_after = ordered_rows(&db, bob.id).await.unwrap();
        assert_eq!(bob_before, bob_after);
        assert_ledger_invariants(&db, &alice).await;
        assert_ledger_invariants(&db, &bob).await;
    }

    fn random_day(rng: &mut impl rand::Rng) -> NaiveDate {
        date(2024, 11, 1) + chrono::Days::new(rng.gen_range(0..45))
    }

    #[tokio::test]
    async fn random_interleavings_preserve_the_invariants() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::{Rng, SeedableRng};

        let db = setup_db().await.unwrap();
        let store = test_store(&db);
        let token = CancellationToken::new();
        let mut rng = StdRng::seed_from_u64(0x1edc3);

        let owners = [
            new_owner(&db, Decimal::from(100)).await.unwrap(),
            new_owner(&db, Decimal::from(-40)).await.unwrap(),
        ];
        let mut live_ids: [Vec<i32>; 2] = [Vec::new(), Vec::new()];

        for _ in 0..80 {
            let which = rng.gen_range(0..owners.len());
            let owner = &owners[which];
            let day = random_day(&mut rng);
            let amount = Decimal::new(rng.gen_range(1..=500_000), 2);
            let kind = if rng.gen_bool(0.5) {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };

            match rng.gen_range(0..4u8) {
                0 | 1 => {
                    let draft = TransactionDraft::new(
                        owner.id,
                        kind,
                        amount,
                        day,
                        "generated",
                        None,
                        PaymentMethod::Other,
                        None,
                        None,
                    )
                    .unwrap();
                    let row = store.insert_transaction(&token, &draft).await.unwrap();
                    live_ids[which].push(row.id);
                }
                2 => {
                    if let Some(&target) = live_ids[which].choose(&mut rng) {
                        let current = store.get_transaction(target).await.unwrap().unwrap();
                        let edit = TransactionEdit::new(
                            kind,
                            amount,
                            day,
                            &current.subject,
                            current.notes.as_deref(),
                            current.payment_method,
                            None,
                            None,
                        )
                        .unwrap();
                        store.update_transaction(&token, target, &edit).await.unwrap();
                    }
                }
                _ => {
                    if !live_ids[which].is_empty() {
                        let position = rng.gen_range(0..live_ids[which].len());
                        let target = live_ids[which].remove(position);
                        store.delete_transaction(&token, target).await.unwrap();
                    }
                }
            }

            for owner in &owners {
                assert_ledger_invariants(&db, owner).await;
            }
        }
    }
}
