//! Compose, sign, and submit dexkit transactions.
//!
//! Submission goes through any [rpc::AbciClient]: an in-process application
//! ([rpc::mock::AbciApp]), a scripted mock ([rpc::mock::AbciMock]), or a
//! recorder wrapping either ([rpc::mock::AbciRecorder]).

pub mod application;
pub mod config;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod rpc;
pub mod transaction;

pub use application::Application;
pub use config::{Config, ConfigError, ValidatedConfig};
pub use rpc::{AbciClient, CancelHandle, Context};
pub use transaction::{BroadcastMode, BroadcastOptions, TransactionClient, TxCommitResult};

use dexkit_types::{TxError, ValidationError};
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
    #[error("application error: {0}")]
    Application(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("no response configured for {0}")]
    NoResponseConfigured(&'static str),
    #[error("no matching expectation for {name}")]
    NoMatchingExpectation { name: &'static str },
    #[error("scripted failure: {0}")]
    Scripted(String),
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
    #[error("transaction error: {0}")]
    Tx(#[from] TxError),
    #[error("invalid data: {0}")]
    InvalidData(#[from] commonware_codec::Error),
    #[error("invalid commit data: {0}")]
    InvalidCommitData(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
