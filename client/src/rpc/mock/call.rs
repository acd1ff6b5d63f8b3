use dexkit_types::{
    abci::{BroadcastResult, CommitResult, InfoResult, QueryOptions, QueryResult},
    Tx,
};
use serde::Serialize;

/// Arguments of a query, as seen by a mock or a recorder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QueryArgs {
    pub path: String,
    pub data: Vec<u8>,
    pub height: u64,
    pub prove: bool,
}

impl QueryArgs {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>, opts: QueryOptions) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
            height: opts.height,
            prove: opts.prove,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallArgs {
    None,
    Query(QueryArgs),
    Tx(Tx),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallResponse {
    Info(InfoResult),
    Query(QueryResult),
    Broadcast(BroadcastResult),
    Commit(CommitResult),
}

impl CallResponse {
    /// Response code, when the response carries one.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Info(_) => None,
            Self::Query(result) => Some(result.response.code),
            Self::Broadcast(result) => Some(result.code),
            Self::Commit(result) => Some(result.deliver_tx.code),
        }
    }
}

/// One recorded invocation.
///
/// Exactly one of `response` and `error` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Call {
    pub name: &'static str,
    pub args: CallArgs,
    pub response: Option<CallResponse>,
    pub error: Option<String>,
}
