//! Transaction settlement over a [`Session`].
//!
//! A store opens a transaction by sending `BEGIN`, runs its statements, and
//! hands the outcome to [`settle`]. On success `COMMIT` is sent; if the
//! statements or the commit fail, `ROLLBACK` is sent before the error is
//! returned, normalized so only typed store errors leave the store.

use tracing::error;

use crate::error::{StoreError, StoreResult};
use crate::executor::Session;

/// Send `BEGIN`.
pub(crate) async fn begin(session: &mut dyn Session) -> StoreResult<()> {
    session.query("BEGIN", &[]).await?;
    Ok(())
}

/// Commit on success; otherwise roll back and normalize the error.
pub(crate) async fn settle<T>(
    session: &mut dyn Session,
    outcome: StoreResult<T>,
    operation: &str,
    unmapped_title: &str,
) -> StoreResult<T> {
    let outcome = match outcome {
        Ok(value) => match session.query("COMMIT", &[]).await {
            Ok(_) => Ok(value),
            Err(e) => Err(StoreError::from(e)),
        },
        Err(e) => Err(e),
    };

    match outcome {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Err(rollback) = session.query("ROLLBACK", &[]).await {
                error!(operation, error = %rollback, "ROLLBACK failed");
            }
            error!(operation, error = %err, "transaction rolled back");
            Err(err.normalize(unmapped_title))
        }
    }
}
