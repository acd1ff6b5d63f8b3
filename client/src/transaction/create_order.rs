use super::{BroadcastMode, BroadcastOptions, TransactionClient, TxCommitResult};
use crate::{
    rpc::{AbciClient, Context},
    Result,
};
use dexkit_types::{
    msg::{combine_symbol, OrderSide},
    KeyManager, Msg,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub tx: TxCommitResult,
    /// Identifier assigned by the chain; only known in sync mode.
    pub order_id: String,
}

#[derive(Deserialize)]
struct OrderData {
    order_id: String,
}

fn parse_order_id(data: &[u8]) -> Result<String> {
    let data: OrderData = serde_json::from_slice(data)?;
    Ok(data.order_id)
}

impl<C: AbciClient, K: KeyManager> TransactionClient<C, K> {
    /// Place a limit order on the `base`/`quote` pair.
    ///
    /// When an accepted transaction is broadcast in sync mode, the order id
    /// is read from the response data; data that does not parse is an error.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_order(
        &self,
        ctx: &Context,
        base: &str,
        quote: &str,
        side: OrderSide,
        price: u64,
        quantity: u64,
        opts: &BroadcastOptions,
    ) -> Result<CreateOrderResult> {
        let symbol = combine_symbol(base, quote)?;
        let msg = Msg::create_order(self.public_key(), "", side, symbol, price, quantity)?;
        let tx = self.broadcast_msg(ctx, msg, opts).await?;
        let order_id = if tx.ok && opts.mode == BroadcastMode::Sync {
            parse_order_id(&tx.data)?
        } else {
            String::new()
        };
        Ok(CreateOrderResult { tx, order_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_account_keypair, DexApp},
        rpc::mock::{AbciApp, AbciMock, Expectation},
        transaction::tests::fee,
        Error,
    };
    use dexkit_types::{abci::BroadcastResult, msg::generate_order_id, ValidationError};
    use std::sync::Arc;

    #[tokio::test]
    async fn sync_order_reports_assigned_id() {
        let (key, public) = create_account_keypair(1);
        let app = AbciApp::new(Arc::new(DexApp::new("test-chain")));
        let client = TransactionClient::new(app, key, "test-chain", fee());

        let result = client
            .create_order(
                &Context::background(),
                "BNB",
                "NNB",
                OrderSide::Buy,
                100_000_000,
                500_000_000,
                &BroadcastOptions::new(9, 3),
            )
            .await
            .unwrap();
        assert!(result.tx.ok);
        assert_eq!(result.order_id, generate_order_id(&public, 3));
    }

    #[tokio::test]
    async fn async_order_skips_parsing() {
        let (key, _) = create_account_keypair(1);
        let mock = AbciMock::new();
        mock.expect_broadcast(Expectation::returning(BroadcastResult {
            data: b"not json".to_vec(),
            ..Default::default()
        }));
        let client = TransactionClient::new(mock, key, "test-chain", fee());

        let opts = BroadcastOptions::new(9, 3).with_mode(BroadcastMode::Async);
        let result = client
            .create_order(
                &Context::background(),
                "BNB",
                "NNB",
                OrderSide::Sell,
                1,
                1,
                &opts,
            )
            .await
            .unwrap();
        assert!(result.order_id.is_empty());
    }

    #[tokio::test]
    async fn malformed_order_data_is_an_error() {
        let (key, _) = create_account_keypair(1);
        let mock = AbciMock::new();
        mock.expect_broadcast(Expectation::returning(BroadcastResult {
            data: br#"{"order":1}"#.to_vec(),
            ..Default::default()
        }));
        let client = TransactionClient::new(mock, key, "test-chain", fee());

        let err = client
            .create_order(
                &Context::background(),
                "BNB",
                "NNB",
                OrderSide::Buy,
                1,
                1,
                &BroadcastOptions::new(9, 3),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCommitData(_)));
    }

    #[tokio::test]
    async fn empty_pair_never_reaches_the_client() {
        let (key, _) = create_account_keypair(1);
        let client = TransactionClient::new(AbciMock::new(), key, "test-chain", fee());

        let err = client
            .create_order(
                &Context::background(),
                "",
                "NNB",
                OrderSide::Buy,
                1,
                1,
                &BroadcastOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Empty("base asset symbol"))
        ));
    }
}
