//! The submission contract shared by every client backend.

pub mod mock;

use crate::{Error, Result};
use dexkit_types::{
    abci::{BroadcastResult, CommitResult, InfoResult, QueryOptions, QueryResult},
    Tx,
};
use futures::future::{pending, select_all};
use std::{future::Future, time::Duration};
use tokio::{
    sync::watch,
    time::{sleep_until, Instant},
};

pub const RPC_INFO: &str = "abci_info";
pub const RPC_QUERY: &str = "abci_query";
pub const RPC_BROADCAST_TX_ASYNC: &str = "broadcast_tx_async";
pub const RPC_BROADCAST_TX_SYNC: &str = "broadcast_tx_sync";
pub const RPC_BROADCAST_TX_COMMIT: &str = "broadcast_tx_commit";

/// Cancellation and deadline carried by every request.
///
/// Derived contexts inherit the cancellation signals and the earliest
/// deadline of their parent.
#[derive(Clone, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels the [Context] it was created with and every context derived from it.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut cancel = self.cancel.clone();
        cancel.push(rx);
        let ctx = Self {
            deadline: self.deadline,
            cancel,
        };
        (ctx, CancelHandle(tx))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.cancel.iter().any(|rx| *rx.borrow()) {
            return Err(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if deadline <= Instant::now() {
                return Err(Error::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Drive `fut` until it resolves or the context ends, whichever is first.
    ///
    /// When the context ends first `fut` is dropped without being polled again.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Error::Cancelled),
            _ = deadline => Err(Error::DeadlineExceeded),
            result = fut => result,
        }
    }

    async fn cancelled(&self) {
        if self.cancel.is_empty() {
            return pending().await;
        }
        let waits = self.cancel.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                // A handle dropped without cancelling never fires.
                if closed {
                    pending::<()>().await;
                }
            })
        });
        select_all(waits).await;
    }
}

/// Operations exposed by a node (or anything standing in for one).
pub trait AbciClient: Send + Sync {
    /// Version and height metadata of the application.
    fn info(&self, ctx: &Context) -> impl Future<Output = Result<InfoResult>> + Send;

    /// Query application state at `path`.
    fn query(
        &self,
        ctx: &Context,
        path: &str,
        data: &[u8],
        opts: QueryOptions,
    ) -> impl Future<Output = Result<QueryResult>> + Send;

    /// Return once the transaction is accepted into the pending pool.
    fn broadcast_tx_async(
        &self,
        ctx: &Context,
        tx: &Tx,
    ) -> impl Future<Output = Result<BroadcastResult>> + Send;

    /// Return the outcome of validating the transaction (not executing it).
    fn broadcast_tx_sync(
        &self,
        ctx: &Context,
        tx: &Tx,
    ) -> impl Future<Output = Result<BroadcastResult>> + Send;

    /// Return once the transaction is committed.
    ///
    /// Backends that cannot observe commits return [CommitResult::default],
    /// for which [CommitResult::is_committed] is false.
    fn broadcast_tx_commit(
        &self,
        ctx: &Context,
        tx: &Tx,
    ) -> impl Future<Output = Result<CommitResult>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_context_runs_to_completion() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        let value = ctx.run(async { Ok(7u64) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_context_fails_fast() {
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();
        assert!(matches!(ctx.check(), Err(Error::Cancelled)));
        let result = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_call() {
        let (ctx, handle) = Context::background().with_cancel();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });
        let result: Result<()> = ctx.run(pending()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn parent_cancel_reaches_children() {
        let (parent, handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.with_cancel();
        let child = child.with_timeout(Duration::from_secs(60));
        handle.cancel();
        assert!(matches!(child.check(), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        drop(handle);
        let value = ctx.run(async { Ok(1u8) }).await.unwrap();
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn deadline_aborts_in_flight_call() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let result: Result<()> = ctx.run(pending()).await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
        assert!(matches!(ctx.check(), Err(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn derived_context_keeps_earliest_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        let child = ctx.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), ctx.deadline());
    }
}
