//! Deadline wrapper for remote calls.

use folio_core::{FolioError, Result};
use std::future::Future;
use std::time::Duration;

/// Runs `call` with a fixed deadline.
///
/// Expiry yields [`FolioError::Timeout`] naming `operation`; the inner future
/// is dropped, which is the only cancellation remote calls get.
pub async fn with_deadline<T, F>(operation: &str, deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                target: "session",
                operation,
                deadline_ms = deadline.as_millis() as u64,
                "Remote call exceeded its deadline"
            );
            Err(FolioError::timeout(operation, deadline))
        }
    }
}
