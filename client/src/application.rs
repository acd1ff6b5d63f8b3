use dexkit_types::abci::{
    RequestCheckTx, RequestInfo, RequestQuery, ResponseCheckTx, ResponseCommit, ResponseInfo,
    ResponseQuery,
};
use std::future::Future;

/// A state machine that can be driven in-process, without a node.
pub trait Application: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn info(
        &self,
        request: RequestInfo,
    ) -> impl Future<Output = Result<ResponseInfo, Self::Error>> + Send;

    fn query(
        &self,
        request: RequestQuery,
    ) -> impl Future<Output = Result<ResponseQuery, Self::Error>> + Send;

    /// Validate a transaction without executing it.
    fn check_tx(
        &self,
        request: RequestCheckTx,
    ) -> impl Future<Output = Result<ResponseCheckTx, Self::Error>> + Send;

    /// Finalize the current block.
    fn commit(&self) -> impl Future<Output = Result<ResponseCommit, Self::Error>> + Send;
}
