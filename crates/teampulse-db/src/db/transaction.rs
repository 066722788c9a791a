//! Transaction helper for multi-step writes that must land atomically, such as an
//! interview with its answers or an accepted invitation with the team membership it adds.

use sqlx::{PgPool, Postgres, Transaction};
use std::future::Future;
use std::pin::Pin;
use teampulse_core::AppError;

pub type TxFuture<'t, R> = Pin<Box<dyn Future<Output = Result<R, AppError>> + Send + 't>>;

/// Execute a closure within a database transaction
///
/// Commits when the closure succeeds and rolls back when it fails.
///
/// # Example
///
/// ```ignore
/// with_transaction(&pool, |tx| Box::pin(async move {
///     sqlx::query("INSERT INTO ...").execute(&mut **tx).await?;
///     sqlx::query("UPDATE ...").execute(&mut **tx).await?;
///     Ok(())
/// })).await?;
/// ```
pub async fn with_transaction<F, R>(pool: &PgPool, f: F) -> Result<R, AppError>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> TxFuture<'t, R>,
{
    let mut tx = pool.begin().await?;

    match f(&mut tx).await {
        Ok(result) => {
            tx.commit().await?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}
