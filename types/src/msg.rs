//! Messages: the named, self-validating actions carried by a transaction.
//!
//! Every message is built through a constructor on [Msg] that runs
//! [Msg::validate_basic] before returning, so an invalid message can never be
//! handed to the signer.

use crate::codec::{read_string, string_encode_size, write_string};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;
use thiserror::Error;

/// Maximum length of a token or pair symbol.
pub const MAX_SYMBOL_LENGTH: usize = 64;

/// Maximum length of an order identifier.
pub const MAX_ORDER_ID_LENGTH: usize = 128;

/// Separator between base and quote asset in a pair symbol.
pub const PAIR_SEPARATOR: char = '_';

/// Error returned when a message fails local validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} can't be empty")]
    Empty(&'static str),
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: u64 },
    #[error("{field} is too long: {len} bytes (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

fn require_symbol(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > MAX_SYMBOL_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max: MAX_SYMBOL_LENGTH,
        });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// Combine a base and quote asset into a pair symbol (`BASE_QUOTE`).
pub fn combine_symbol(base: &str, quote: &str) -> Result<String, ValidationError> {
    require_symbol("base asset symbol", base)?;
    require_symbol("quote asset symbol", quote)?;
    Ok(format!("{base}{PAIR_SEPARATOR}{quote}"))
}

/// Identifier a chain assigns to the order placed by `sender` at `sequence`.
pub fn generate_order_id(sender: &PublicKey, sequence: u64) -> String {
    format!("{}-{sequence}", hex(sender.as_ref()).to_uppercase())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OrderSide {
    Buy = 1,
    Sell = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OrderType {
    Limit = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeInForce {
    GoodTillExpire = 1,
    ImmediateOrCancel = 3,
}

impl TryFrom<u8> for OrderSide {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Buy),
            2 => Ok(Self::Sell),
            other => Err(Error::InvalidEnum(other)),
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Limit),
            other => Err(Error::InvalidEnum(other)),
        }
    }
}

impl TryFrom<u8> for TimeInForce {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::GoodTillExpire),
            3 => Ok(Self::ImmediateOrCancel),
            other => Err(Error::InvalidEnum(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOrderMsg {
    pub sender: PublicKey,
    /// Empty when the chain is expected to assign the identifier.
    pub id: String,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub price: u64,
    pub quantity: u64,
    pub time_in_force: TimeInForce,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CancelOrderMsg {
    pub sender: PublicKey,
    pub symbol: String,
    pub ref_id: String,
}

/// Shared shape of burn and freeze.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenAmountMsg {
    pub from: PublicKey,
    pub symbol: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DexListMsg {
    pub from: PublicKey,
    pub proposal_id: u64,
    pub base_asset_symbol: String,
    pub quote_asset_symbol: String,
    pub init_price: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    /// Place a limit order.
    /// Binary: [1] [sender:32] [id] [symbol] [type:u8] [side:u8] [price:u64 BE] [quantity:u64 BE] [tif:u8]
    CreateOrder(CreateOrderMsg),

    /// Cancel an open order.
    /// Binary: [2] [sender:32] [symbol] [refId]
    CancelOrder(CancelOrderMsg),

    /// Burn tokens held by the sender.
    /// Binary: [3] [from:32] [symbol] [amount:u64 BE]
    TokenBurn(TokenAmountMsg),

    /// Freeze tokens held by the sender.
    /// Binary: [4] [from:32] [symbol] [amount:u64 BE]
    TokenFreeze(TokenAmountMsg),

    /// List a trading pair approved by a governance proposal.
    /// Binary: [5] [from:32] [proposalId:u64 BE] [base] [quote] [initPrice:u64 BE]
    DexList(DexListMsg),
}

impl Msg {
    pub fn create_order(
        sender: PublicKey,
        id: impl Into<String>,
        side: OrderSide,
        symbol: impl Into<String>,
        price: u64,
        quantity: u64,
    ) -> Result<Self, ValidationError> {
        Self::CreateOrder(CreateOrderMsg {
            sender,
            id: id.into(),
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            price,
            quantity,
            time_in_force: TimeInForce::GoodTillExpire,
        })
        .validated()
    }

    pub fn cancel_order(
        sender: PublicKey,
        symbol: impl Into<String>,
        ref_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::CancelOrder(CancelOrderMsg {
            sender,
            symbol: symbol.into(),
            ref_id: ref_id.into(),
        })
        .validated()
    }

    pub fn burn_token(
        from: PublicKey,
        symbol: impl Into<String>,
        amount: u64,
    ) -> Result<Self, ValidationError> {
        Self::TokenBurn(TokenAmountMsg {
            from,
            symbol: symbol.into(),
            amount,
        })
        .validated()
    }

    pub fn freeze_token(
        from: PublicKey,
        symbol: impl Into<String>,
        amount: u64,
    ) -> Result<Self, ValidationError> {
        Self::TokenFreeze(TokenAmountMsg {
            from,
            symbol: symbol.into(),
            amount,
        })
        .validated()
    }

    pub fn list_pair(
        from: PublicKey,
        proposal_id: u64,
        base_asset_symbol: impl Into<String>,
        quote_asset_symbol: impl Into<String>,
        init_price: u64,
    ) -> Result<Self, ValidationError> {
        Self::DexList(DexListMsg {
            from,
            proposal_id,
            base_asset_symbol: base_asset_symbol.into(),
            quote_asset_symbol: quote_asset_symbol.into(),
            init_price,
        })
        .validated()
    }

    fn validated(self) -> Result<Self, ValidationError> {
        self.validate_basic()?;
        Ok(self)
    }

    /// Module the message is routed to.
    pub fn route(&self) -> &'static str {
        match self {
            Self::CreateOrder(_) | Self::CancelOrder(_) => "orders",
            Self::TokenBurn(_) => "tokensBurn",
            Self::TokenFreeze(_) => "tokensFreeze",
            Self::DexList(_) => "dexList",
        }
    }

    /// Discriminator of the action within its route.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateOrder(_) => "orderNew",
            Self::CancelOrder(_) => "orderCancel",
            Self::TokenBurn(_) => "tokensBurn",
            Self::TokenFreeze(_) => "tokensFreeze",
            Self::DexList(_) => "dexList",
        }
    }

    /// Account that must sign for this message.
    pub fn signer(&self) -> &PublicKey {
        match self {
            Self::CreateOrder(msg) => &msg.sender,
            Self::CancelOrder(msg) => &msg.sender,
            Self::TokenBurn(msg) | Self::TokenFreeze(msg) => &msg.from,
            Self::DexList(msg) => &msg.from,
        }
    }

    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        match self {
            Self::CreateOrder(msg) => {
                if msg.id.len() > MAX_ORDER_ID_LENGTH {
                    return Err(ValidationError::TooLong {
                        field: "order id",
                        len: msg.id.len(),
                        max: MAX_ORDER_ID_LENGTH,
                    });
                }
                require_symbol("symbol", &msg.symbol)?;
                require_positive("price", msg.price)?;
                require_positive("quantity", msg.quantity)
            }
            Self::CancelOrder(msg) => {
                require_symbol("symbol", &msg.symbol)?;
                if msg.ref_id.is_empty() {
                    return Err(ValidationError::Empty("order ref id"));
                }
                if msg.ref_id.len() > MAX_ORDER_ID_LENGTH {
                    return Err(ValidationError::TooLong {
                        field: "order ref id",
                        len: msg.ref_id.len(),
                        max: MAX_ORDER_ID_LENGTH,
                    });
                }
                Ok(())
            }
            Self::TokenBurn(msg) | Self::TokenFreeze(msg) => {
                require_symbol("symbol", &msg.symbol)?;
                require_positive("amount", msg.amount)
            }
            Self::DexList(msg) => {
                require_positive("proposal id", msg.proposal_id)?;
                require_symbol("base asset symbol", &msg.base_asset_symbol)?;
                require_symbol("quote asset symbol", &msg.quote_asset_symbol)?;
                require_positive("init price", msg.init_price)
            }
        }
    }
}

impl Write for TokenAmountMsg {
    fn write(&self, writer: &mut impl BufMut) {
        self.from.write(writer);
        write_string(&self.symbol, writer);
        self.amount.write(writer);
    }
}

impl Read for TokenAmountMsg {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            from: PublicKey::read(reader)?,
            symbol: read_string(reader, MAX_SYMBOL_LENGTH)?,
            amount: u64::read(reader)?,
        })
    }
}

impl EncodeSize for TokenAmountMsg {
    fn encode_size(&self) -> usize {
        PublicKey::SIZE + string_encode_size(&self.symbol) + u64::SIZE
    }
}

impl Write for Msg {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CreateOrder(msg) => {
                1u8.write(writer);
                msg.sender.write(writer);
                write_string(&msg.id, writer);
                write_string(&msg.symbol, writer);
                (msg.order_type as u8).write(writer);
                (msg.side as u8).write(writer);
                msg.price.write(writer);
                msg.quantity.write(writer);
                (msg.time_in_force as u8).write(writer);
            }
            Self::CancelOrder(msg) => {
                2u8.write(writer);
                msg.sender.write(writer);
                write_string(&msg.symbol, writer);
                write_string(&msg.ref_id, writer);
            }
            Self::TokenBurn(msg) => {
                3u8.write(writer);
                msg.write(writer);
            }
            Self::TokenFreeze(msg) => {
                4u8.write(writer);
                msg.write(writer);
            }
            Self::DexList(msg) => {
                5u8.write(writer);
                msg.from.write(writer);
                msg.proposal_id.write(writer);
                write_string(&msg.base_asset_symbol, writer);
                write_string(&msg.quote_asset_symbol, writer);
                msg.init_price.write(writer);
            }
        }
    }
}

impl Read for Msg {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let msg = match u8::read(reader)? {
            1 => Self::CreateOrder(CreateOrderMsg {
                sender: PublicKey::read(reader)?,
                id: read_string(reader, MAX_ORDER_ID_LENGTH)?,
                symbol: read_string(reader, MAX_SYMBOL_LENGTH)?,
                order_type: OrderType::try_from(u8::read(reader)?)?,
                side: OrderSide::try_from(u8::read(reader)?)?,
                price: u64::read(reader)?,
                quantity: u64::read(reader)?,
                time_in_force: TimeInForce::try_from(u8::read(reader)?)?,
            }),
            2 => Self::CancelOrder(CancelOrderMsg {
                sender: PublicKey::read(reader)?,
                symbol: read_string(reader, MAX_SYMBOL_LENGTH)?,
                ref_id: read_string(reader, MAX_ORDER_ID_LENGTH)?,
            }),
            3 => Self::TokenBurn(TokenAmountMsg::read(reader)?),
            4 => Self::TokenFreeze(TokenAmountMsg::read(reader)?),
            5 => Self::DexList(DexListMsg {
                from: PublicKey::read(reader)?,
                proposal_id: u64::read(reader)?,
                base_asset_symbol: read_string(reader, MAX_SYMBOL_LENGTH)?,
                quote_asset_symbol: read_string(reader, MAX_SYMBOL_LENGTH)?,
                init_price: u64::read(reader)?,
            }),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(msg)
    }
}

impl EncodeSize for Msg {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::CreateOrder(msg) => {
                    PublicKey::SIZE
                        + string_encode_size(&msg.id)
                        + string_encode_size(&msg.symbol)
                        + u8::SIZE
                        + u8::SIZE
                        + u64::SIZE
                        + u64::SIZE
                        + u8::SIZE
                }
                Self::CancelOrder(msg) => {
                    PublicKey::SIZE
                        + string_encode_size(&msg.symbol)
                        + string_encode_size(&msg.ref_id)
                }
                Self::TokenBurn(msg) | Self::TokenFreeze(msg) => msg.encode_size(),
                Self::DexList(msg) => {
                    PublicKey::SIZE
                        + u64::SIZE
                        + string_encode_size(&msg.base_asset_symbol)
                        + string_encode_size(&msg.quote_asset_symbol)
                        + u64::SIZE
                }
            }
    }
}
