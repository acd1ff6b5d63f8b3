use super::{
    call::QueryArgs,
    script::{Expectation, Script},
};
use crate::{
    rpc::{AbciClient, Context, RPC_BROADCAST_TX_COMMIT, RPC_INFO, RPC_QUERY},
    Result,
};
use dexkit_types::{
    abci::{BroadcastResult, CommitResult, InfoResult, QueryOptions, QueryResult},
    Tx,
};
use tracing::trace;

const BROADCAST_SCRIPT: &str = "broadcast_tx";

/// Answers every call from a script, for deterministic unit tests.
///
/// Async and sync broadcasts share the `broadcast` script. Every call
/// consumes one expectation; a call with nothing queued fails with
/// [crate::Error::NoResponseConfigured].
#[derive(Debug)]
pub struct AbciMock {
    pub info: Script<(), InfoResult>,
    pub query: Script<QueryArgs, QueryResult>,
    pub broadcast: Script<Tx, BroadcastResult>,
    pub broadcast_commit: Script<Tx, CommitResult>,
}

impl Default for AbciMock {
    fn default() -> Self {
        Self::new()
    }
}

impl AbciMock {
    pub fn new() -> Self {
        Self {
            info: Script::new(RPC_INFO),
            query: Script::new(RPC_QUERY),
            broadcast: Script::new(BROADCAST_SCRIPT),
            broadcast_commit: Script::new(RPC_BROADCAST_TX_COMMIT),
        }
    }

    pub fn expect_info(&self, expectation: Expectation<(), InfoResult>) -> &Self {
        self.info.push(expectation);
        self
    }

    pub fn expect_query(&self, expectation: Expectation<QueryArgs, QueryResult>) -> &Self {
        self.query.push(expectation);
        self
    }

    pub fn expect_broadcast(&self, expectation: Expectation<Tx, BroadcastResult>) -> &Self {
        self.broadcast.push(expectation);
        self
    }

    pub fn expect_broadcast_commit(&self, expectation: Expectation<Tx, CommitResult>) -> &Self {
        self.broadcast_commit.push(expectation);
        self
    }

    /// Total expectations not yet consumed across all scripts.
    pub fn remaining(&self) -> usize {
        self.info.remaining()
            + self.query.remaining()
            + self.broadcast.remaining()
            + self.broadcast_commit.remaining()
    }
}

impl AbciClient for AbciMock {
    async fn info(&self, ctx: &Context) -> Result<InfoResult> {
        ctx.check()?;
        trace!(rpc = RPC_INFO, "dispensing scripted response");
        self.info.next(&())
    }

    async fn query(
        &self,
        ctx: &Context,
        path: &str,
        data: &[u8],
        opts: QueryOptions,
    ) -> Result<QueryResult> {
        ctx.check()?;
        trace!(rpc = RPC_QUERY, path, "dispensing scripted response");
        self.query.next(&QueryArgs::new(path, data, opts))
    }

    async fn broadcast_tx_async(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        ctx.check()?;
        self.broadcast.next(tx)
    }

    async fn broadcast_tx_sync(&self, ctx: &Context, tx: &Tx) -> Result<BroadcastResult> {
        ctx.check()?;
        self.broadcast.next(tx)
    }

    async fn broadcast_tx_commit(&self, ctx: &Context, tx: &Tx) -> Result<CommitResult> {
        ctx.check()?;
        self.broadcast_commit.next(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use dexkit_types::abci::ResponseQuery;

    fn query_ok(value: &[u8]) -> QueryResult {
        QueryResult {
            response: ResponseQuery {
                value: value.to_vec(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn query_matches_exact_args() {
        let mock = AbciMock::new();
        let opts = QueryOptions {
            height: 5,
            prove: true,
        };
        mock.expect_query(
            Expectation::returning(query_ok(b"v")).with_args(QueryArgs::new("/key", *b"k", opts)),
        );
        let ctx = Context::background();

        let miss = mock
            .query(&ctx, "/key", b"k", QueryOptions::default())
            .await;
        assert!(matches!(
            miss,
            Err(Error::NoMatchingExpectation { name: "abci_query" })
        ));

        let hit = mock.query(&ctx, "/key", b"k", opts).await.unwrap();
        assert_eq!(hit.response.value, b"v".to_vec());
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_mock_reports_missing_response() {
        let mock = AbciMock::new();
        let ctx = Context::background();
        let tx = Tx(vec![1, 2, 3]);

        assert!(matches!(
            mock.info(&ctx).await,
            Err(Error::NoResponseConfigured("abci_info"))
        ));
        assert!(matches!(
            mock.broadcast_tx_async(&ctx, &tx).await,
            Err(Error::NoResponseConfigured("broadcast_tx"))
        ));
        assert!(matches!(
            mock.broadcast_tx_commit(&ctx, &tx).await,
            Err(Error::NoResponseConfigured("broadcast_tx_commit"))
        ));
    }

    #[tokio::test]
    async fn async_and_sync_share_the_broadcast_script() {
        let mock = AbciMock::new();
        let tx = Tx(vec![9]);
        let first = BroadcastResult {
            code: 0,
            log: "first".to_string(),
            ..Default::default()
        };
        let second = BroadcastResult {
            code: 3,
            log: "second".to_string(),
            ..Default::default()
        };
        mock.expect_broadcast(Expectation::returning(first.clone()))
            .expect_broadcast(Expectation::returning(second.clone()));
        let ctx = Context::background();

        assert_eq!(mock.broadcast_tx_sync(&ctx, &tx).await.unwrap(), first);
        assert_eq!(mock.broadcast_tx_async(&ctx, &tx).await.unwrap(), second);
        assert_eq!(mock.broadcast.remaining(), 0);
    }

    #[tokio::test]
    async fn cancelled_call_consumes_nothing() {
        let mock = AbciMock::new();
        mock.expect_info(Expectation::returning(InfoResult::default()));
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();

        assert!(matches!(mock.info(&ctx).await, Err(Error::Cancelled)));
        assert_eq!(mock.info.remaining(), 1);
    }

    #[tokio::test]
    async fn scripted_commit() {
        let mock = AbciMock::new();
        let tx = Tx(vec![4]);
        let committed = CommitResult {
            height: 12,
            hash: tx.hash_bytes(),
            ..Default::default()
        };
        mock.expect_broadcast_commit(
            Expectation::returning(committed.clone()).with_args(tx.clone()),
        );

        let result = mock
            .broadcast_tx_commit(&Context::background(), &tx)
            .await
            .unwrap();
        assert!(result.is_committed());
        assert_eq!(result, committed);
    }
}
