use super::{BroadcastOptions, TransactionClient, TxCommitResult};
use crate::{
    rpc::{AbciClient, Context},
    Result,
};
use dexkit_types::{KeyManager, Msg};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPairResult {
    pub tx: TxCommitResult,
}

impl<C: AbciClient, K: KeyManager> TransactionClient<C, K> {
    /// List the `base`/`quote` pair approved by governance proposal `proposal_id`.
    pub async fn list_pair(
        &self,
        ctx: &Context,
        proposal_id: u64,
        base: &str,
        quote: &str,
        init_price: u64,
        opts: &BroadcastOptions,
    ) -> Result<ListPairResult> {
        let msg = Msg::list_pair(self.public_key(), proposal_id, base, quote, init_price)?;
        let tx = self.broadcast_msg(ctx, msg, opts).await?;
        Ok(ListPairResult { tx })
    }
}
