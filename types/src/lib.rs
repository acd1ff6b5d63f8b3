pub mod abci;
pub mod codec;
mod compat;
pub mod msg;
pub mod tx;

pub use msg::{Msg, OrderSide, ValidationError};
pub use tx::{
    sign, sign_tx, Coin, KeyManager, StdFee, StdSignMsg, StdSignature, StdTx, Tx, TxError,
    TRANSACTION_NAMESPACE,
};
