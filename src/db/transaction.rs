//! Atomic units of work.
//!
//! A unit receives the connection of a freshly opened transaction. If it
//! returns `Ok`, every write it made is committed; if it returns `Err`, all
//! of them are rolled back and the unit's own error is handed back unchanged.

use super::pool::DbPool;
use crate::error::AppError;
use futures::future::BoxFuture;
use sqlx::SqliteConnection;

/// Run `unit` inside a single transaction.
///
/// Build the unit with `async move { .. }.boxed()` and move owned copies of
/// whatever it needs into it; the connection is only borrowed for the
/// duration of the unit.
pub async fn run_atomic<T, F>(pool: &DbPool, unit: F) -> Result<T, AppError>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, AppError>>,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| super::store_error(e, "begin transaction"))?;

    match unit(&mut *tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| super::store_error(e, "commit transaction"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb_err) = tx.rollback().await {
                log::error!(
                    "Failed to roll back transaction: {} (original error: {})",
                    rb_err,
                    err
                );
            } else {
                log::debug!("Rolled back transaction: {}", err);
            }
            Err(err)
        }
    }
}
