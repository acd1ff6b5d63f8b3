//! High-level operations: build a message, sign it, and broadcast it.

mod burn_token;
mod cancel_order;
mod create_order;
mod freeze_token;
mod list_pair;

pub use burn_token::BurnTokenResult;
pub use cancel_order::CancelOrderResult;
pub use create_order::CreateOrderResult;
pub use freeze_token::FreezeTokenResult;
pub use list_pair::ListPairResult;

use crate::{
    rpc::{AbciClient, Context},
    Result,
};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;
use dexkit_types::{
    abci::{BroadcastResult, CommitResult},
    sign_tx, KeyManager, Msg, StdFee, StdSignMsg, StdTx, Tx,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How long to wait after handing a transaction to the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastMode {
    /// Return once the transaction is in the pending pool.
    Async,
    /// Return once the transaction has been validated.
    #[default]
    Sync,
    /// Return once the transaction is committed.
    Commit,
}

/// Per-transaction settings. Account number and sequence are never looked
/// up or advanced by the client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastOptions {
    pub account_number: u64,
    pub sequence: u64,
    pub memo: String,
    pub source: u64,
    pub mode: BroadcastMode,
}

impl BroadcastOptions {
    pub fn new(account_number: u64, sequence: u64) -> Self {
        Self {
            account_number,
            sequence,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: BroadcastMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_source(mut self, source: u64) -> Self {
        self.source = source;
        self
    }
}

/// Outcome of a broadcast, whatever the mode.
///
/// `ok` only means the transaction was not rejected. Whether it landed in a
/// block is reported by [TxCommitResult::is_committed]; a commit-mode
/// broadcast against a backend that cannot observe commits is `ok` but not
/// committed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCommitResult {
    pub ok: bool,
    pub log: String,
    /// Uppercase hex transaction hash.
    pub hash: String,
    pub code: u32,
    pub data: Vec<u8>,
    /// Block the transaction was committed in, 0 if not known to be committed.
    pub height: u64,
}

impl TxCommitResult {
    fn from_broadcast(result: BroadcastResult, hash: String) -> Self {
        Self {
            ok: result.is_ok(),
            hash: reported_hash(&result.hash, hash),
            code: result.code,
            log: result.log,
            data: result.data,
            height: 0,
        }
    }

    fn from_commit(result: CommitResult, hash: String) -> Self {
        let ok = result.is_ok();
        let height = result.height;
        let hash = reported_hash(&result.hash, hash);
        // A failed check never reaches delivery.
        let outcome = if result.check_tx.is_ok() {
            (result.deliver_tx.code, result.deliver_tx.log, result.deliver_tx.data)
        } else {
            (result.check_tx.code, result.check_tx.log, result.check_tx.data)
        };
        Self {
            ok,
            hash,
            code: outcome.0,
            log: outcome.1,
            data: outcome.2,
            height,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.height > 0
    }
}

fn reported_hash(reported: &[u8], computed: String) -> String {
    if reported.is_empty() {
        computed
    } else {
        hex(reported).to_uppercase()
    }
}

/// Signs messages with one key and submits them through an [AbciClient].
pub struct TransactionClient<C, K> {
    client: C,
    key: K,
    chain_id: String,
    fee: StdFee,
}

impl<C: AbciClient, K: KeyManager> TransactionClient<C, K> {
    pub fn new(client: C, key: K, chain_id: impl Into<String>, fee: StdFee) -> Self {
        Self {
            client,
            key,
            chain_id: chain_id.into(),
            fee,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    /// Wrap `msg` in an envelope and sign it, without submitting anything.
    pub fn sign_msg(&self, msg: Msg, opts: &BroadcastOptions) -> Result<StdTx> {
        let envelope = StdSignMsg {
            chain_id: self.chain_id.clone(),
            account_number: opts.account_number,
            sequence: opts.sequence,
            memo: opts.memo.clone(),
            fee: self.fee.clone(),
            msgs: vec![msg],
            source: opts.source,
        };
        Ok(sign_tx(&self.key, envelope)?)
    }

    pub async fn broadcast_msg(
        &self,
        ctx: &Context,
        msg: Msg,
        opts: &BroadcastOptions,
    ) -> Result<TxCommitResult> {
        let name = msg.name();
        let tx = Tx::from(&self.sign_msg(msg, opts)?);
        let hash = tx.hash_hex();
        debug!(msg = name, hash = %hash, mode = ?opts.mode, "broadcasting transaction");

        let result = match opts.mode {
            BroadcastMode::Async => {
                let result = self.client.broadcast_tx_async(ctx, &tx).await?;
                TxCommitResult::from_broadcast(result, hash)
            }
            BroadcastMode::Sync => {
                let result = self.client.broadcast_tx_sync(ctx, &tx).await?;
                TxCommitResult::from_broadcast(result, hash)
            }
            BroadcastMode::Commit => {
                let result = self.client.broadcast_tx_commit(ctx, &tx).await?;
                let result = TxCommitResult::from_commit(result, hash);
                if result.ok && !result.is_committed() {
                    warn!(msg = name, hash = %result.hash, "commit not observed");
                }
                result
            }
        };
        if !result.ok {
            warn!(
                msg = name,
                hash = %result.hash,
                code = result.code,
                log = %result.log,
                "transaction rejected"
            );
        }
        Ok(result)
    }
}
