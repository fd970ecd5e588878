//! RequestContext - Deadline della richiesta, indipendente dal framework HTTP
//!
//! Quando la deadline scade il future dell'operazione viene droppato: la transazione
//! aperta viene droppata con lui e fa rollback.

use super::error::ErrorCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Nessuna deadline (job interni, test)
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Esegue l'operazione entro la deadline. A deadline già scaduta l'operazione
    /// non parte nemmeno (nessuna transazione aperta).
    pub async fn run<T, F>(&self, operation: F) -> Result<T, ErrorCode>
    where
        F: Future<Output = Result<T, ErrorCode>>,
    {
        if self.is_expired() {
            warn!("Request deadline already exceeded, operation not started");
            return Err(ErrorCode::RequestTimeout);
        }

        match self.deadline {
            None => operation.await,
            Some(deadline) => match timeout_at(deadline, operation).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Request deadline exceeded, operation aborted");
                    Err(ErrorCode::RequestTimeout)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_context_never_expires() {
        let ctx = RequestContext::background();
        assert!(!ctx.is_expired());
        assert_eq!(ctx.run(async { Ok::<_, ErrorCode>(7) }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_expired_deadline_aborts_operation() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(10));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ErrorCode>(())
            })
            .await;
        assert_eq!(result, Err(ErrorCode::RequestTimeout));
        assert!(ctx.is_expired());
    }

    #[tokio::test]
    async fn test_expired_context_does_not_start_operation() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        let started = std::sync::atomic::AtomicBool::new(false);

        let result = ctx
            .run(async {
                started.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok::<_, ErrorCode>(())
            })
            .await;

        assert_eq!(result, Err(ErrorCode::RequestTimeout));
        assert!(!started.load(std::sync::atomic::Ordering::SeqCst));
    }
}
