use super::call::{Call, CallArgs, CallResponse, QueryArgs};
use crate::{
    rpc::{
        AbciClient, Context, RPC_BROADCAST_TX_ASYNC, RPC_BROADCAST_TX_COMMIT,
        RPC_BROADCAST_TX_SYNC, RPC_INFO, RPC_QUERY,
    },
    Result,
};
use dexkit_types::{
    abci::{BroadcastResult, CommitResult, InfoResult, QueryOptions, QueryResult},
    Tx,
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Wraps another client and logs every call it forwards.
///
/// A call is logged once the wrapped client returns, with either its
/// response or its error; results pass through untouched. A call that is
/// dropped before returning leaves no entry.
pub struct AbciRecorder<C> {
    client: Arc<C>,
    calls: Mutex<Vec<Call>>,
}

impl<C: AbciClient> AbciRecorder<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &Arc<C> {
        &self.client
    }

    /// Snapshot of the log, in invocation order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record<T>(
        &self,
        name: &'static str,
        args: CallArgs,
        result: &Result<T>,
        response: impl FnOnce(&T) -> CallResponse,
    ) {
        let call = match result {
            Ok(value) => Call {
                name,
                args,
                response: Some(response(value)),
                error: None,
            },
            Err(err) => Call {
                name,
                args,
                response: None,
                error: Some(err.to_string()),
            },
        };
        debug!(rpc = name, ok = call.error.is_none(), "recorded call");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl<C: AbciClient> AbciClient for AbciRecorder<C> {
    async fn info(&self, ctx: &Context) -> Result<InfoResult> {
        let result = self.client.info(ctx).await;
        self.record(RPC_INFO, CallArgs::None, &result, |r| {
            CallResponse::Info(r.clone())
        });
        result
    }

    async fn query(
        &self,
        ctx: &Context,
        path: &str,
        data: &[u8],
        opts: QueryOptions,
    ) -> Result<QueryResult> {
        let result = self.client.query(ctx, path, data, opts).await;
        let args = CallArgs::Query(QueryArgs::new(path, data, opts));
        self.record(RPC_QUERY, args, &result, |r| CallResponse::Query(r.clone()));
        result
    }

    async fn broadcast_tx_async(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        let result = self.client.broadcast_tx_async(ctx, tx).await;
        self.record(RPC_BROADCAST_TX_ASYNC, CallArgs::Tx(tx.clone()), &result, |r| {
            CallResponse::Broadcast(r.clone())
        });
        result
    }

    async fn broadcast_tx_sync(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        let result = self.client.broadcast_tx_sync(ctx, tx).await;
        self.record(RPC_BROADCAST_TX_SYNC, CallArgs::Tx(tx.clone()), &result, |r| {
            CallResponse::Broadcast(r.clone())
        });
        result
    }

    async fn broadcast_tx_commit(&self, ctx: &Context, tx: &Tx) -> Result<CommitResult> {
        let result = self.client.broadcast_tx_commit(ctx, tx).await;
        self.record(RPC_BROADCAST_TX_COMMIT, CallArgs::Tx(tx.clone()), &result, |r| {
            CallResponse::Commit(r.clone())
        });
        result
    }
}
