//! Cancellation plumbing for remote calls
//!
//! Every remote call issued by a lifecycle operation races the caller's
//! [`CancellationToken`]. Once the token fires the call is abandoned and the
//! operation stops; mutations already committed remotely stay in place.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run one remote call unless, or until, `cancel` fires
pub async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_result_through() {
        let cancel = CancellationToken::new();
        let value = guarded(&cancel, async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_call() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut called = false;
        let result = guarded(&cancel, async {
            called = true;
            Ok::<_, Error>(())
        })
        .await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!called);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_call() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let pending = guarded(&cancel, async {
            std::future::pending::<()>().await;
            Ok::<_, Error>(())
        });
        trigger.cancel();

        assert!(matches!(pending.await, Err(Error::Cancelled)));
    }
}
