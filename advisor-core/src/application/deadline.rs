//! Deadline guard for calls into unreliable dependencies.
//!
//! The guarded future is raced against a timer. When the timer wins the
//! future is dropped, which cancels it at its current suspension point;
//! resources it owns are released by their own `Drop` impls (child processes
//! are spawned with kill-on-drop, SSE readers abort their task). Retries are
//! the caller's business.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (after {}ms)", .after.as_millis())]
pub struct DeadlineExceeded {
    pub message: String,
    pub after: Duration,
}

/// Run `operation` with a deadline. Its own result (success or error) is
/// returned untouched when it finishes first.
pub async fn with_deadline<F, T>(
    operation: F,
    duration: Duration,
    failure_message: impl Into<String>,
) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(duration, operation).await {
        Ok(output) => Ok(output),
        Err(_) => {
            let message = failure_message.into();
            debug!(timeout_ms = duration.as_millis() as u64, %message, "Deadline exceeded");
            Err(DeadlineExceeded {
                message,
                after: duration,
            })
        }
    }
}

/// Like [`with_deadline`] but leaves the operation unbounded when no duration
/// is configured.
pub async fn with_optional_deadline<F, T>(
    operation: F,
    duration: Option<Duration>,
    failure_message: impl Into<String>,
) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    match duration {
        Some(duration) => with_deadline(operation, duration, failure_message).await,
        None => Ok(operation.await),
    }
}
