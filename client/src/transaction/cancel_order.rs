use super::{BroadcastOptions, TransactionClient, TxCommitResult};
use crate::{
    rpc::{AbciClient, Context},
    Result,
};
use dexkit_types::{msg::combine_symbol, KeyManager, Msg};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderResult {
    pub tx: TxCommitResult,
}

impl<C: AbciClient, K: KeyManager> TransactionClient<C, K> {
    /// Cancel the open order `ref_id` on the `base`/`quote` pair.
    pub async fn cancel_order(
        &self,
        ctx: &Context,
        base: &str,
        quote: &str,
        ref_id: &str,
        opts: &BroadcastOptions,
    ) -> Result<CancelOrderResult> {
        let symbol = combine_symbol(base, quote)?;
        let msg = Msg::cancel_order(self.public_key(), symbol, ref_id)?;
        let tx = self.broadcast_msg(ctx, msg, opts).await?;
        Ok(CancelOrderResult { tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_account_keypair, DexApp},
        rpc::mock::{AbciApp, AbciRecorder, CallArgs},
        transaction::tests::fee,
        Error,
    };
    use commonware_cryptography::ed25519::PrivateKey;
    use dexkit_types::{StdTx, ValidationError};
    use std::sync::Arc;

    type Client = TransactionClient<AbciRecorder<AbciApp<DexApp>>, PrivateKey>;

    fn client(seed: u64) -> Client {
        let (key, _) = create_account_keypair(seed);
        let app = AbciApp::new(Arc::new(DexApp::new("test-chain")));
        TransactionClient::new(AbciRecorder::new(Arc::new(app)), key, "test-chain", fee())
    }

    #[tokio::test]
    async fn cancel_is_signed_and_accepted() {
        let client = client(4);
        let result = client
            .cancel_order(
                &Context::background(),
                "BNB",
                "NNB",
                "ORDER-1",
                &BroadcastOptions::new(1, 2),
            )
            .await
            .unwrap();
        assert!(result.tx.ok);

        let calls = client.client().calls();
        assert_eq!(calls.len(), 1);
        let CallArgs::Tx(tx) = &calls[0].args else {
            panic!("expected a transaction argument");
        };
        let decoded = StdTx::try_from(tx).unwrap();
        assert_eq!(
            decoded.msgs(),
            &[Msg::cancel_order(client.public_key(), "BNB_NNB", "ORDER-1").unwrap()]
        );
    }

    #[tokio::test]
    async fn empty_reference_never_reaches_the_client() {
        let client = client(4);
        let err = client
            .cancel_order(
                &Context::background(),
                "BNB",
                "NNB",
                "",
                &BroadcastOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Empty("order ref id"))
        ));
        assert!(client.client().calls().is_empty());
    }
}
