//! Serializable unit-of-work execution with bounded, jittered retry.
//!
//! Every mutating ledger operation runs through [`run_serializable`]: one
//! transaction from begin to commit, serialization conflicts retried with
//! capped exponential back-off, deadlines and cancellation enforced around
//! the whole attempt.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rand::Rng;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, IsolationLevel,
    TransactionTrait,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{LedgerError, Result};

/// Retry and deadline policy for storage calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `Conflict` surfaces once exhausted.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Per-call deadline. `Timeout` is final and never retried.
    pub command_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
            command_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Doubling delay with ±25% jitter so colliding writers do not retry in
    /// lockstep.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let doubled = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        doubled.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
    }
}

type BoxedTxnFuture<'c, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'c>>;

/// Runs `op` inside a serializable transaction, committing on success and
/// rolling back on error. The closure is re-invoked on each retry, so it
/// must capture its inputs by clone.
pub(crate) async fn run_serializable<T, F>(
    db: &DatabaseConnection,
    policy: &RetryPolicy,
    token: &CancellationToken,
    op: F,
) -> Result<T>
where
    T: Send,
    F: for<'c> Fn(&'c DatabaseTransaction) -> BoxedTxnFuture<'c, T> + Send + Sync,
{
    let mut attempt = 0u32;
    loop {
        let unit_of_work = async {
            let txn = begin_serializable(db).await?;
            match op(&txn).await {
                Ok(value) => {
                    txn.commit().await.map_err(LedgerError::from)?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        warn!("rollback after failed unit-of-work also failed: {rollback_err}");
                    }
                    Err(err)
                }
            }
        };

        // Cancellation drops the in-flight transaction, which rolls back.
        let outcome = tokio::select! {
            _ = token.cancelled() => return Err(LedgerError::Cancelled),
            result = tokio::time::timeout(policy.command_timeout, unit_of_work) => {
                result.unwrap_or_else(|_| Err(LedgerError::Timeout))
            }
        };

        match outcome {
            Err(LedgerError::Conflict) if attempt < policy.max_retries => {
                let delay = policy.backoff_delay(attempt);
                debug!(attempt, ?delay, "serialization conflict, retrying unit-of-work");
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

/// SQLite transactions are serializable by construction; the explicit level
/// is for engines that default to weaker isolation.
async fn begin_serializable(db: &DatabaseConnection) -> Result<DatabaseTransaction> {
    let txn = match db.get_database_backend() {
        DbBackend::Sqlite => db.begin().await,
        _ => {
            db.begin_with_config(Some(IsolationLevel::Serializable), None)
                .await
        }
    };
    txn.map_err(LedgerError::from)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use sea_orm::Database;
    use tokio_util::sync::CancellationToken;

    use super::{RetryPolicy, run_serializable};
    use crate::error::LedgerError;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            command_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn conflicts_exhaust_the_retry_budget() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let result: Result<(), _> =
            run_serializable(&db, &fast_policy(), &CancellationToken::new(), move |_txn| {
                let seen = seen.clone();
                Box::pin(async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(LedgerError::Conflict)
                })
            })
            .await;

        assert!(matches!(result, Err(LedgerError::Conflict)));
        // one initial attempt plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn timeout_is_final() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let policy = RetryPolicy {
            command_timeout: Duration::from_millis(20),
            ..fast_policy()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let result: Result<(), _> =
            run_serializable(&db, &policy, &CancellationToken::new(), move |_txn| {
                let seen = seen.clone();
                Box::pin(async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(result, Err(LedgerError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_preempts_the_unit_of_work() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result: Result<(), _> =
            run_serializable(&db, &fast_policy(), &token, move |_txn| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Ok(())
                })
            })
            .await;

        assert!(matches!(result, Err(LedgerError::Cancelled)));
    }

    #[tokio::test]
    async fn other_errors_do_not_retry() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let calls = Arc::new(AtomicU32::new(0));
        let seen = calls.clone();

        let result: Result<(), _> =
            run_serializable(&db, &fast_policy(), &CancellationToken::new(), move |_txn| {
                let seen = seen.clone();
                Box::pin(async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(LedgerError::NotFound)
                })
            })
            .await;

        assert!(matches!(result, Err(LedgerError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
