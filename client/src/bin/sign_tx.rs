//! Sign a single message offline and print its transport encoding.
//!
//! Usage: cargo run --bin sign-tx -- --config signer.yaml burn --symbol NNB --amount 10

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use dexkit_client::Config;
use dexkit_types::{
    msg::combine_symbol, sign_tx, KeyManager, Msg, OrderSide, StdSignMsg, StdTx, Tx,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sign-tx")]
#[command(about = "Sign a message with a configured key")]
struct Args {
    /// YAML signer configuration
    #[arg(short, long, default_value = "signer.yaml")]
    config: String,

    /// Override the configured sequence
    #[arg(long)]
    sequence: Option<u64>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for OrderSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => OrderSide::Buy,
            Side::Sell => OrderSide::Sell,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Place a limit order
    CreateOrder {
        #[arg(long)]
        base: String,
        #[arg(long)]
        quote: String,
        #[arg(long, value_enum)]
        side: Side,
        #[arg(long)]
        price: u64,
        #[arg(long)]
        quantity: u64,
    },
    /// Cancel an open order
    CancelOrder {
        #[arg(long)]
        base: String,
        #[arg(long)]
        quote: String,
        #[arg(long)]
        ref_id: String,
    },
    /// Burn tokens
    Burn {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        amount: u64,
    },
    /// Freeze tokens
    Freeze {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        amount: u64,
    },
    /// List a trading pair under an approved proposal
    ListPair {
        #[arg(long)]
        proposal_id: u64,
        #[arg(long)]
        base: String,
        #[arg(long)]
        quote: String,
        #[arg(long)]
        init_price: u64,
    },
}

fn build_msg(action: Action, key: &impl KeyManager) -> anyhow::Result<Msg> {
    let from = key.public_key();
    let msg = match action {
        Action::CreateOrder {
            base,
            quote,
            side,
            price,
            quantity,
        } => {
            let symbol = combine_symbol(&base, &quote)?;
            Msg::create_order(from, "", side.into(), symbol, price, quantity)?
        }
        Action::CancelOrder { base, quote, ref_id } => {
            let symbol = combine_symbol(&base, &quote)?;
            Msg::cancel_order(from, symbol, ref_id)?
        }
        Action::Burn { symbol, amount } => Msg::burn_token(from, symbol, amount)?,
        Action::Freeze { symbol, amount } => Msg::freeze_token(from, symbol, amount)?,
        Action::ListPair {
            proposal_id,
            base,
            quote,
            init_price,
        } => Msg::list_pair(from, proposal_id, base, quote, init_price)?,
    };
    Ok(msg)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config))?;
    let redacted = format!("{:?}", config.redacted_debug());
    let config = config.validate().context("invalid signer configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();
    info!(config = %redacted, "loaded signer");

    let msg = build_msg(args.action, &config.signer)?;
    let envelope = StdSignMsg {
        chain_id: config.chain_id,
        account_number: config.options.account_number,
        sequence: args.sequence.unwrap_or(config.options.sequence),
        memo: config.options.memo,
        fee: config.fee,
        msgs: vec![msg],
        source: config.options.source,
    };
    let tx: StdTx = sign_tx(&config.signer, envelope)?;
    let hash = Tx::from(&tx).hash_hex();
    info!(hash = %hash, "signed transaction");

    println!("{}", tx.to_hex());
    println!("hash: {hash}");
    Ok(())
}
