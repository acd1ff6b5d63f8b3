use crate::{
    application::Application,
    rpc::{AbciClient, Context},
    Error, Result,
};
use dexkit_types::{
    abci::{
        BroadcastResult, CommitResult, InfoResult, QueryOptions, QueryResult, RequestCheckTx,
        RequestInfo, RequestQuery,
    },
    Tx,
};
use std::sync::Arc;
use tracing::{debug, trace};

fn application_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    Error::Application(Box::new(err))
}

/// Sends every request straight to an in-process [Application], so callers
/// can be tested against real application behavior without a node.
///
/// Async and sync broadcasts both run `check_tx` and are indistinguishable.
/// [AbciApp::broadcast_tx_commit] does not wait for a commit: it returns
/// [CommitResult::default] and callers drive [Application::commit] themselves.
pub struct AbciApp<A> {
    app: Arc<A>,
}

impl<A> Clone for AbciApp<A> {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
        }
    }
}

impl<A: Application> AbciApp<A> {
    pub fn new(app: Arc<A>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &Arc<A> {
        &self.app
    }

    async fn check_tx(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        let request = RequestCheckTx { tx: tx.clone() };
        let response = ctx
            .run(async { self.app.check_tx(request).await.map_err(application_error) })
            .await?;
        let result = BroadcastResult {
            code: response.code,
            data: response.data,
            log: response.log,
            hash: tx.hash_bytes(),
        };
        trace!(code = result.code, hash = %tx.hash_hex(), "checked transaction");
        Ok(result)
    }
}

impl<A: Application> AbciClient for AbciApp<A> {
    async fn info(&self, ctx: &Context) -> Result<InfoResult> {
        let response = ctx
            .run(async {
                self.app
                    .info(RequestInfo::client())
                    .await
                    .map_err(application_error)
            })
            .await?;
        Ok(InfoResult { response })
    }

    async fn query(
        &self,
        ctx: &Context,
        path: &str,
        data: &[u8],
        opts: QueryOptions,
    ) -> Result<QueryResult> {
        let request = RequestQuery {
            data: data.to_vec(),
            path: path.to_string(),
            height: opts.height,
            prove: opts.prove,
        };
        let response = ctx
            .run(async { self.app.query(request).await.map_err(application_error) })
            .await?;
        Ok(QueryResult { response })
    }

    async fn broadcast_tx_async(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        self.check_tx(ctx, tx).await
    }

    async fn broadcast_tx_sync(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        self.check_tx(ctx, tx).await
    }

    async fn broadcast_tx_commit(&self, ctx: &Context, tx: &Tx) -> Result<CommitResult> {
        ctx.check()?;
        debug!(hash = %tx.hash_hex(), "commit not awaited by in-process client");
        Ok(CommitResult::default())
    }
}
