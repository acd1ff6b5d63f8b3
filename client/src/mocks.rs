//! In-memory application and key helpers for tests.

use crate::application::Application;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Sha256,
    Hasher, Signer,
};
use dexkit_types::{
    abci::{
        RequestCheckTx, RequestInfo, RequestQuery, ResponseCheckTx, ResponseCommit, ResponseInfo,
        ResponseQuery, CODE_OK,
    },
    msg::generate_order_id,
    sign_tx, Coin, Msg, StdFee, StdSignMsg, StdTx, Tx,
};
use futures::future::pending;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};
use thiserror::Error;

pub const CODE_DECODE: u32 = 2;
pub const CODE_UNAUTHORIZED: u32 = 4;
pub const CODE_NOT_FOUND: u32 = 6;

pub const PATH_HEIGHT: &str = "/store/height";
pub const PATH_PENDING: &str = "/tx/pending";
pub const PATH_COMMITTED: &str = "/tx/committed";

#[derive(Debug, Error)]
pub enum DexAppError {
    #[error("application halted")]
    Halted,
}

#[derive(Default)]
struct State {
    height: u64,
    app_hash: Vec<u8>,
    pending: Vec<Tx>,
    committed: HashMap<Vec<u8>, Tx>,
}

/// Minimal exchange application: verifies signatures on `check_tx`, queues
/// accepted transactions, and folds them into the app hash on `commit`.
pub struct DexApp {
    chain_id: String,
    state: Mutex<State>,
    halted: AtomicBool,
    stalled: AtomicBool,
}

impl DexApp {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            state: Mutex::new(State::default()),
            halted: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    /// Fail every subsequent request with [DexAppError::Halted].
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    /// Never answer subsequent `check_tx` requests.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn height(&self) -> u64 {
        self.state().height
    }

    /// Accepted transactions not yet committed.
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_running(&self) -> Result<(), DexAppError> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(DexAppError::Halted);
        }
        Ok(())
    }

    fn check(&self, tx: &Tx) -> ResponseCheckTx {
        let std_tx = match StdTx::try_from(tx) {
            Ok(std_tx) => std_tx,
            Err(err) => return rejected(CODE_DECODE, format!("tx decode failed: {err}")),
        };
        if !std_tx.verify(&self.chain_id) {
            return rejected(CODE_UNAUTHORIZED, "signature verification failed".to_string());
        }

        let data = match (std_tx.msgs.first(), std_tx.signatures.first()) {
            (Some(Msg::CreateOrder(order)), Some(signature)) => {
                let order_id = if order.id.is_empty() {
                    generate_order_id(&order.sender, signature.sequence)
                } else {
                    order.id.clone()
                };
                serde_json::json!({ "order_id": order_id })
                    .to_string()
                    .into_bytes()
            }
            _ => Vec::new(),
        };
        self.state().pending.push(tx.clone());
        ResponseCheckTx {
            code: CODE_OK,
            data,
            log: "ok".to_string(),
            ..Default::default()
        }
    }
}

fn rejected(code: u32, log: String) -> ResponseCheckTx {
    ResponseCheckTx {
        code,
        log,
        ..Default::default()
    }
}

impl Application for DexApp {
    type Error = DexAppError;

    async fn info(&self, request: RequestInfo) -> Result<ResponseInfo, Self::Error> {
        self.ensure_running()?;
        let state = self.state();
        Ok(ResponseInfo {
            data: self.chain_id.clone(),
            version: request.version,
            app_version: 1,
            last_block_height: state.height,
            last_block_app_hash: state.app_hash.clone(),
        })
    }

    async fn query(&self, request: RequestQuery) -> Result<ResponseQuery, Self::Error> {
        self.ensure_running()?;
        let state = self.state();
        let mut response = ResponseQuery {
            height: state.height,
            key: request.data.clone(),
            ..Default::default()
        };
        match request.path.as_str() {
            PATH_HEIGHT => response.value = state.height.to_be_bytes().to_vec(),
            PATH_PENDING => response.value = (state.pending.len() as u64).to_be_bytes().to_vec(),
            PATH_COMMITTED => match state.committed.get(&request.data) {
                Some(tx) => response.value = tx.as_bytes().to_vec(),
                None => {
                    response.code = CODE_NOT_FOUND;
                    response.log = "transaction not found".to_string();
                }
            },
            other => {
                response.code = CODE_NOT_FOUND;
                response.log = format!("unknown path: {other}");
            }
        }
        if request.prove && response.is_ok() {
            response.proof = Some(state.app_hash.clone());
        }
        Ok(response)
    }

    async fn check_tx(&self, request: RequestCheckTx) -> Result<ResponseCheckTx, Self::Error> {
        self.ensure_running()?;
        if self.stalled.load(Ordering::SeqCst) {
            pending::<()>().await;
        }
        Ok(self.check(&request.tx))
    }

    async fn commit(&self) -> Result<ResponseCommit, Self::Error> {
        self.ensure_running()?;
        let mut state = self.state();
        let mut hasher = Sha256::new();
        hasher.update(&state.app_hash);
        let pending = std::mem::take(&mut state.pending);
        for tx in pending {
            hasher.update(tx.as_bytes());
            state.committed.insert(tx.hash_bytes(), tx);
        }
        let digest = hasher.finalize();
        let app_hash: &[u8] = digest.as_ref();
        state.app_hash = app_hash.to_vec();
        state.height += 1;
        Ok(ResponseCommit {
            data: state.app_hash.clone(),
            retain_height: 0,
        })
    }
}

/// Deterministic ed25519 keypair for an account.
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

/// A signed transaction burning one `NNB` from the account derived from `seed`.
pub fn signed_burn(seed: u64, chain_id: &str, sequence: u64) -> Tx {
    let (private, public) = create_account_keypair(seed);
    let envelope = StdSignMsg {
        chain_id: chain_id.to_string(),
        account_number: seed,
        sequence,
        memo: String::new(),
        fee: StdFee::new(200_000, Coin::new("BNB", 1)),
        msgs: vec![Msg::burn_token(public, "NNB", 1).expect("burn message is valid")],
        source: 0,
    };
    let tx = sign_tx(&private, envelope).expect("envelope is valid");
    Tx::from(&tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_moves_pending_into_state() {
        let app = DexApp::new("test-chain");
        let tx = signed_burn(3, "test-chain", 0);
        let response = app
            .check_tx(RequestCheckTx { tx: tx.clone() })
            .await
            .unwrap();
        assert_eq!(response.code, CODE_OK);
        assert_eq!(app.pending(), 1);

        let commit = app.commit().await.unwrap();
        assert_eq!(commit.data.len(), 32);
        assert_eq!(app.pending(), 0);
        assert_eq!(app.height(), 1);

        let found = app
            .query(RequestQuery {
                data: tx.hash_bytes(),
                path: PATH_COMMITTED.to_string(),
                height: 0,
                prove: true,
            })
            .await
            .unwrap();
        assert!(found.is_ok());
        assert_eq!(found.value, tx.as_bytes().to_vec());
        assert_eq!(found.proof, Some(commit.data));
    }

    #[tokio::test]
    async fn garbage_is_rejected_with_decode_code() {
        let app = DexApp::new("test-chain");
        let response = app
            .check_tx(RequestCheckTx {
                tx: Tx(vec![0xff, 0x00]),
            })
            .await
            .unwrap();
        assert_eq!(response.code, CODE_DECODE);
        assert_eq!(app.pending(), 0);
    }

    #[tokio::test]
    async fn halted_app_fails_requests() {
        let app = DexApp::new("test-chain");
        app.halt();
        assert!(matches!(
            app.info(RequestInfo::client()).await,
            Err(DexAppError::Halted)
        ));
    }
}
