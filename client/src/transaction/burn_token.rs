use super::{BroadcastOptions, TransactionClient, TxCommitResult};
use crate::{
    rpc::{AbciClient, Context},
    Result,
};
use dexkit_types::{KeyManager, Msg};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnTokenResult {
    pub tx: TxCommitResult,
}

impl<C: AbciClient, K: KeyManager> TransactionClient<C, K> {
    pub async fn burn_token(
        &self,
        ctx: &Context,
        symbol: &str,
        amount: u64,
        opts: &BroadcastOptions,
    ) -> Result<BurnTokenResult> {
        let msg = Msg::burn_token(self.public_key(), symbol, amount)?;
        let tx = self.broadcast_msg(ctx, msg, opts).await?;
        Ok(BurnTokenResult { tx })
    }
}
