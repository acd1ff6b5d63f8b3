//! Request, response, and result models exchanged with a state machine
//! application, either in-process or through a node.

use crate::tx::Tx;
use serde::{Deserialize, Serialize};

/// Response code of an accepted request.
pub const CODE_OK: u32 = 0;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub version: String,
}

impl RequestInfo {
    /// Request tagged with this library's version.
    pub fn client() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestQuery {
    pub data: Vec<u8>,
    pub path: String,
    pub height: u64,
    pub prove: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCheckTx {
    pub tx: Tx,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub data: String,
    pub version: String,
    pub app_version: u64,
    pub last_block_height: u64,
    pub last_block_app_hash: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseQuery {
    pub code: u32,
    pub log: String,
    pub info: String,
    pub index: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub proof: Option<Vec<u8>>,
    pub height: u64,
    pub codespace: String,
}

impl ResponseQuery {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub codespace: String,
}

impl ResponseCheckTx {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Outcome of executing a transaction inside a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDeliverTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub codespace: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCommit {
    /// App hash after the commit.
    pub data: Vec<u8>,
    pub retain_height: u64,
}

/// Options for a state query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Height to query at; zero queries the latest committed height.
    pub height: u64,
    /// Ask the application to attach a proof to the response.
    pub prove: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResult {
    pub response: ResponseInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: ResponseQuery,
}

/// Result of `broadcast_tx_async` and `broadcast_tx_sync`.
///
/// In async mode the node has only accepted the transaction into its pending
/// pool. In sync mode `code`, `data` and `log` describe the validation step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub hash: Vec<u8>,
}

impl BroadcastResult {
    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

/// Result of `broadcast_tx_commit`.
///
/// The default value is the empty placeholder returned by clients that do not
/// wait for a commit; `height` is zero in that case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub check_tx: ResponseCheckTx,
    pub deliver_tx: ResponseDeliverTx,
    pub hash: Vec<u8>,
    pub height: u64,
}

impl CommitResult {
    pub fn is_ok(&self) -> bool {
        self.check_tx.code == CODE_OK && self.deliver_tx.code == CODE_OK
    }

    /// Whether this result reports an actual commit.
    pub fn is_committed(&self) -> bool {
        self.height > 0
    }
}
