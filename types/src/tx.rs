//! Signable envelopes, signatures, and signed transactions.
//!
//! The canonical form of a [StdSignMsg] is written field by field in a fixed
//! order: chain id, account number, sequence, fee, memo, messages, source.
//! Integers are fixed-width big-endian, strings and lists carry a `u32`
//! big-endian length. Two envelopes with equal fields always produce equal
//! bytes, which is what lets independently produced signatures verify.

use crate::{
    codec::{length_prefix, read_string, string_encode_size, strip_length_prefix, write_string},
    msg::{Msg, ValidationError, MAX_SYMBOL_LENGTH},
};
use bytes::{Buf, BufMut};
use commonware_codec::{DecodeExt, Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey, Signature},
    sha256::{Digest, Sha256},
    Hasher, Signer, Verifier,
};
use commonware_utils::{from_hex, hex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain separator prefixed to every transaction signature.
pub const TRANSACTION_NAMESPACE: &[u8] = b"_DEXKIT_TX";

pub const MAX_CHAIN_ID_LENGTH: usize = 64;
pub const MAX_MEMO_LENGTH: usize = 128;
pub const MAX_MSGS: usize = 16;
pub const MAX_FEE_COINS: usize = 8;
pub const MAX_SIGNATURES: usize = 8;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("chain id can't be empty")]
    EmptyChainId,
    #[error("chain id is too long: {len} bytes (max {max})")]
    ChainIdTooLong { len: usize, max: usize },
    #[error("transaction must carry at least one message")]
    NoMessages,
    #[error("too many messages: {got} (max {max})")]
    TooManyMessages { got: usize, max: usize },
    #[error("too many fee coins: {got} (max {max})")]
    TooManyFeeCoins { got: usize, max: usize },
    #[error("fee coin {index} has an invalid denom: {len} bytes (expected 1..={max})")]
    InvalidFeeDenom { index: usize, len: usize, max: usize },
    #[error("memo is too long: {len} bytes (max {max})")]
    MemoTooLong { len: usize, max: usize },
    #[error("message {index} is invalid: {source}")]
    InvalidMessage {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("too many signatures: {got} (max {max})")]
    TooManySignatures { got: usize, max: usize },
    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl Write for Coin {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.denom, writer);
        self.amount.write(writer);
    }
}

impl Read for Coin {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            denom: read_string(reader, MAX_SYMBOL_LENGTH)?,
            amount: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Coin {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.denom) + u64::SIZE
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: u64,
}

impl StdFee {
    pub fn new(gas: u64, coin: Coin) -> Self {
        Self {
            amount: vec![coin],
            gas,
        }
    }
}

impl Write for StdFee {
    fn write(&self, writer: &mut impl BufMut) {
        write_list(&self.amount, writer);
        self.gas.write(writer);
    }
}

impl Read for StdFee {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            amount: read_list(reader, MAX_FEE_COINS)?,
            gas: u64::read(reader)?,
        })
    }
}

impl EncodeSize for StdFee {
    fn encode_size(&self) -> usize {
        list_encode_size(&self.amount) + u64::SIZE
    }
}

fn write_list<T: Write>(items: &[T], writer: &mut impl BufMut) {
    (items.len() as u32).write(writer);
    for item in items {
        item.write(writer);
    }
}

fn read_list<T: Read<Cfg = ()>>(reader: &mut impl Buf, max: usize) -> Result<Vec<T>, Error> {
    let len = u32::read(reader)? as usize;
    if len > max {
        return Err(Error::Invalid("List", "too many items"));
    }
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(T::read(reader)?);
    }
    Ok(items)
}

fn list_encode_size<T: EncodeSize>(items: &[T]) -> usize {
    u32::SIZE + items.iter().map(EncodeSize::encode_size).sum::<usize>()
}

/// Borrowed view over the fields that are signed.
struct SignDoc<'a> {
    chain_id: &'a str,
    account_number: u64,
    sequence: u64,
    fee: &'a StdFee,
    memo: &'a str,
    msgs: &'a [Msg],
    source: u64,
}

impl SignDoc<'_> {
    fn validate(&self) -> Result<(), TxError> {
        if self.chain_id.is_empty() {
            return Err(TxError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LENGTH {
            return Err(TxError::ChainIdTooLong {
                len: self.chain_id.len(),
                max: MAX_CHAIN_ID_LENGTH,
            });
        }
        if self.msgs.is_empty() {
            return Err(TxError::NoMessages);
        }
        if self.msgs.len() > MAX_MSGS {
            return Err(TxError::TooManyMessages {
                got: self.msgs.len(),
                max: MAX_MSGS,
            });
        }
        if self.fee.amount.len() > MAX_FEE_COINS {
            return Err(TxError::TooManyFeeCoins {
                got: self.fee.amount.len(),
                max: MAX_FEE_COINS,
            });
        }
        for (index, coin) in self.fee.amount.iter().enumerate() {
            let len = coin.denom.len();
            if len == 0 || len > MAX_SYMBOL_LENGTH {
                return Err(TxError::InvalidFeeDenom {
                    index,
                    len,
                    max: MAX_SYMBOL_LENGTH,
                });
            }
        }
        if self.memo.len() > MAX_MEMO_LENGTH {
            return Err(TxError::MemoTooLong {
                len: self.memo.len(),
                max: MAX_MEMO_LENGTH,
            });
        }
        for (index, msg) in self.msgs.iter().enumerate() {
            msg.validate_basic()
                .map_err(|source| TxError::InvalidMessage { index, source })?;
        }
        Ok(())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.validate()?;
        let mut bytes = Vec::new();
        write_string(self.chain_id, &mut bytes);
        self.account_number.write(&mut bytes);
        self.sequence.write(&mut bytes);
        self.fee.write(&mut bytes);
        write_string(self.memo, &mut bytes);
        write_list(self.msgs, &mut bytes);
        self.source.write(&mut bytes);
        Ok(bytes)
    }
}

/// Envelope of messages plus the account metadata that gets signed.
///
/// The sequence is always supplied by the caller; nothing here tracks or
/// advances account state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdSignMsg {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub memo: String,
    pub fee: StdFee,
    pub msgs: Vec<Msg>,
    pub source: u64,
}

impl StdSignMsg {
    fn doc(&self) -> SignDoc<'_> {
        SignDoc {
            chain_id: &self.chain_id,
            account_number: self.account_number,
            sequence: self.sequence,
            fee: &self.fee,
            memo: &self.memo,
            msgs: &self.msgs,
            source: self.source,
        }
    }

    pub fn validate(&self) -> Result<(), TxError> {
        self.doc().validate()
    }

    /// Canonical bytes used as the signing input.
    pub fn sign_bytes(&self) -> Result<Vec<u8>, TxError> {
        self.doc().to_bytes()
    }
}

/// Signing capability: turns canonical bytes into a signature for one key.
pub trait KeyManager: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn sign(&self, namespace: &[u8], message: &[u8]) -> Result<Signature, TxError>;
}

impl KeyManager for PrivateKey {
    fn public_key(&self) -> PublicKey {
        Signer::public_key(self)
    }

    fn sign(&self, namespace: &[u8], message: &[u8]) -> Result<Signature, TxError> {
        Ok(Signer::sign(self, namespace, message))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdSignature {
    pub pub_key: PublicKey,
    pub signature: Signature,
    pub account_number: u64,
    pub sequence: u64,
}

impl Write for StdSignature {
    fn write(&self, writer: &mut impl BufMut) {
        self.pub_key.write(writer);
        self.signature.write(writer);
        self.account_number.write(writer);
        self.sequence.write(writer);
    }
}

impl Read for StdSignature {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            pub_key: PublicKey::read(reader)?,
            signature: Signature::read(reader)?,
            account_number: u64::read(reader)?,
            sequence: u64::read(reader)?,
        })
    }
}

impl EncodeSize for StdSignature {
    fn encode_size(&self) -> usize {
        PublicKey::SIZE + Signature::SIZE + u64::SIZE + u64::SIZE
    }
}

/// Sign the canonical bytes of `msg` with `key`.
pub fn sign(key: &impl KeyManager, msg: &StdSignMsg) -> Result<StdSignature, TxError> {
    let bytes = msg.sign_bytes()?;
    let signature = key.sign(TRANSACTION_NAMESPACE, &bytes)?;
    Ok(StdSignature {
        pub_key: key.public_key(),
        signature,
        account_number: msg.account_number,
        sequence: msg.sequence,
    })
}

/// Canonicalize, sign, and encode `msg` with a single key.
pub fn sign_tx(key: &impl KeyManager, msg: StdSignMsg) -> Result<StdTx, TxError> {
    let signature = sign(key, &msg)?;
    StdTx::new(msg, vec![signature])
}

/// A signed transaction ready for transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StdTx {
    pub msgs: Vec<Msg>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    pub memo: String,
    pub source: u64,
}

impl StdTx {
    /// Attach `signatures` to the envelope, consuming its messages.
    pub fn new(msg: StdSignMsg, signatures: Vec<StdSignature>) -> Result<Self, TxError> {
        if signatures.len() > MAX_SIGNATURES {
            return Err(TxError::TooManySignatures {
                got: signatures.len(),
                max: MAX_SIGNATURES,
            });
        }
        Ok(Self {
            msgs: msg.msgs,
            fee: msg.fee,
            signatures,
            memo: msg.memo,
            source: msg.source,
        })
    }

    pub fn msgs(&self) -> &[Msg] {
        &self.msgs
    }

    /// Check every signature against `chain_id` and that every message
    /// signer is covered by some signature.
    pub fn verify(&self, chain_id: &str) -> bool {
        if self.signatures.is_empty() {
            return false;
        }
        let covered = self.msgs.iter().all(|msg| {
            self.signatures
                .iter()
                .any(|sig| &sig.pub_key == msg.signer())
        });
        if !covered {
            return false;
        }
        self.signatures.iter().all(|sig| {
            let doc = SignDoc {
                chain_id,
                account_number: sig.account_number,
                sequence: sig.sequence,
                fee: &self.fee,
                memo: &self.memo,
                msgs: &self.msgs,
                source: self.source,
            };
            match doc.to_bytes() {
                Ok(bytes) => sig
                    .pub_key
                    .verify(TRANSACTION_NAMESPACE, &bytes, &sig.signature),
                Err(_) => false,
            }
        })
    }

    /// Length-prefixed binary transport form.
    pub fn to_bytes(&self) -> Vec<u8> {
        length_prefix(&self.encode())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::decode(strip_length_prefix(bytes)?)
    }

    /// Hex rendering of [StdTx::to_bytes].
    pub fn to_hex(&self) -> String {
        hex(&self.to_bytes())
    }

    pub fn from_hex(value: &str) -> Result<Self, Error> {
        let bytes = from_hex(value).ok_or(Error::Invalid("StdTx", "invalid hex"))?;
        Self::from_bytes(&bytes)
    }
}

impl Write for StdTx {
    fn write(&self, writer: &mut impl BufMut) {
        write_list(&self.msgs, writer);
        self.fee.write(writer);
        write_list(&self.signatures, writer);
        write_string(&self.memo, writer);
        self.source.write(writer);
    }
}

impl Read for StdTx {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            msgs: read_list(reader, MAX_MSGS)?,
            fee: StdFee::read(reader)?,
            signatures: read_list(reader, MAX_SIGNATURES)?,
            memo: read_string(reader, MAX_MEMO_LENGTH)?,
            source: u64::read(reader)?,
        })
    }
}

impl EncodeSize for StdTx {
    fn encode_size(&self) -> usize {
        list_encode_size(&self.msgs)
            + self.fee.encode_size()
            + list_encode_size(&self.signatures)
            + string_encode_size(&self.memo)
            + u64::SIZE
    }
}

/// Opaque transaction bytes as handed to a submission client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tx(pub Vec<u8>);

impl Tx {
    pub fn hash(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.finalize()
    }

    /// [Tx::hash] as raw bytes.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let digest = self.hash();
        let bytes: &[u8] = digest.as_ref();
        bytes.to_vec()
    }

    /// Uppercase hex of [Tx::hash], the form nodes report.
    pub fn hash_hex(&self) -> String {
        hex(self.hash().as_ref()).to_uppercase()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&StdTx> for Tx {
    fn from(tx: &StdTx) -> Self {
        Self(tx.to_bytes())
    }
}

impl From<Vec<u8>> for Tx {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&Tx> for StdTx {
    type Error = Error;

    fn try_from(tx: &Tx) -> Result<Self, Self::Error> {
        StdTx::from_bytes(&tx.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::OrderSide;
    use proptest::prelude::*;

    fn key(seed: u64) -> PrivateKey {
        PrivateKey::from_seed(seed)
    }

    fn list_pair_envelope(signer: &PrivateKey) -> StdSignMsg {
        StdSignMsg {
            chain_id: "test-chain".to_string(),
            account_number: 42,
            sequence: 1,
            memo: String::new(),
            fee: StdFee::new(5000, Coin::new("BNB", 5000)),
            msgs: vec![Msg::list_pair(
                Signer::public_key(signer),
                7,
                "BNB",
                "NNB",
                100_000_000,
            )
            .unwrap()],
            source: 0,
        }
    }

    #[test]
    fn list_pair_round_trips_through_hex() {
        let signer = key(1);
        let envelope = list_pair_envelope(&signer);
        let expected = envelope.msgs.clone();

        let tx = sign_tx(&signer, envelope).unwrap();
        let hex_tx = tx.to_hex();
        assert!(!hex_tx.is_empty());

        let decoded = StdTx::from_hex(&hex_tx).unwrap();
        assert_eq!(decoded.msgs(), expected.as_slice());
        assert_eq!(decoded, tx);
        assert!(decoded.verify("test-chain"));
    }

    #[test]
    fn multi_message_envelope_round_trips() {
        let signer = key(2);
        let from = Signer::public_key(&signer);
        let msgs = vec![
            Msg::create_order(from.clone(), "", OrderSide::Buy, "BNB_NNB", 100_000_000, 500_000_000)
                .unwrap(),
            Msg::cancel_order(from.clone(), "BNB_NNB", "ORDER-1").unwrap(),
            Msg::freeze_token(from, "NNB", 10).unwrap(),
        ];
        let envelope = StdSignMsg {
            chain_id: "bnc-chain-1".to_string(),
            account_number: 100,
            sequence: 1,
            memo: "batch".to_string(),
            fee: StdFee::new(5000, Coin::new("BNB", 100_000_000)),
            msgs: msgs.clone(),
            source: 2,
        };

        let tx = sign_tx(&signer, envelope).unwrap();
        let decoded = StdTx::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(decoded.msgs, msgs);
        assert!(decoded.verify("bnc-chain-1"));
    }

    #[test]
    fn signature_does_not_verify_on_other_chain() {
        let signer = key(3);
        let tx = sign_tx(&signer, list_pair_envelope(&signer)).unwrap();
        assert!(!tx.verify("other-chain"));
    }

    #[test]
    fn signature_requires_message_signer() {
        let signer = key(4);
        let stranger = key(5);
        let envelope = list_pair_envelope(&signer);
        let tx = sign_tx(&stranger, envelope).unwrap();
        assert!(!tx.verify("test-chain"));
    }

    #[test]
    fn tampered_tx_fails_verification() {
        let signer = key(6);
        let mut tx = sign_tx(&signer, list_pair_envelope(&signer)).unwrap();
        tx.memo = "tampered".to_string();
        assert!(!tx.verify("test-chain"));
    }

    #[test]
    fn canonicalize_rejects_malformed_envelopes() {
        let signer = key(7);

        let mut envelope = list_pair_envelope(&signer);
        envelope.chain_id.clear();
        assert_eq!(envelope.sign_bytes(), Err(TxError::EmptyChainId));

        let mut envelope = list_pair_envelope(&signer);
        envelope.msgs.clear();
        assert_eq!(envelope.sign_bytes(), Err(TxError::NoMessages));

        let mut envelope = list_pair_envelope(&signer);
        envelope.memo = "m".repeat(MAX_MEMO_LENGTH + 1);
        assert!(matches!(
            envelope.sign_bytes(),
            Err(TxError::MemoTooLong { .. })
        ));

        let mut envelope = list_pair_envelope(&signer);
        if let Msg::DexList(msg) = &mut envelope.msgs[0] {
            msg.base_asset_symbol.clear();
        }
        assert_eq!(
            sign(&signer, &envelope),
            Err(TxError::InvalidMessage {
                index: 0,
                source: ValidationError::Empty("base asset symbol"),
            })
        );
    }

    #[test]
    fn fee_denoms_must_decode() {
        let signer = key(11);

        let mut envelope = list_pair_envelope(&signer);
        envelope.fee = StdFee::new(5000, Coin::new("B".repeat(MAX_SYMBOL_LENGTH + 1), 5000));
        assert_eq!(
            sign_tx(&signer, envelope).unwrap_err(),
            TxError::InvalidFeeDenom {
                index: 0,
                len: MAX_SYMBOL_LENGTH + 1,
                max: MAX_SYMBOL_LENGTH,
            }
        );

        let mut envelope = list_pair_envelope(&signer);
        envelope.fee.amount.push(Coin::new("", 1));
        assert!(matches!(
            envelope.sign_bytes(),
            Err(TxError::InvalidFeeDenom { index: 1, len: 0, .. })
        ));

        let mut envelope = list_pair_envelope(&signer);
        envelope.fee = StdFee::new(5000, Coin::new("B".repeat(MAX_SYMBOL_LENGTH), 5000));
        let tx = sign_tx(&signer, envelope).unwrap();
        assert_eq!(StdTx::from_hex(&tx.to_hex()).unwrap(), tx);
    }

    struct UnavailableKey(PrivateKey);

    impl KeyManager for UnavailableKey {
        fn public_key(&self) -> PublicKey {
            Signer::public_key(&self.0)
        }

        fn sign(&self, _: &[u8], _: &[u8]) -> Result<Signature, TxError> {
            Err(TxError::Signing("device locked".to_string()))
        }
    }

    #[test]
    fn signing_failure_reaches_caller() {
        let signer = key(12);
        let envelope = list_pair_envelope(&signer);
        let unavailable = UnavailableKey(signer);

        assert_eq!(
            sign(&unavailable, &envelope),
            Err(TxError::Signing("device locked".to_string()))
        );
        assert!(matches!(
            sign_tx(&unavailable, envelope),
            Err(TxError::Signing(_))
        ));
    }

    #[test]
    fn from_bytes_rejects_trailing_data() {
        let signer = key(8);
        let tx = sign_tx(&signer, list_pair_envelope(&signer)).unwrap();
        let mut bytes = tx.to_bytes();
        bytes.push(0);
        assert!(StdTx::from_bytes(&bytes).is_err());
        assert!(StdTx::from_hex("zz").is_err());
    }

    #[test]
    fn tx_hash_is_sha256_of_transport_bytes() {
        let signer = key(9);
        let std_tx = sign_tx(&signer, list_pair_envelope(&signer)).unwrap();
        let tx = Tx::from(&std_tx);
        assert_eq!(tx.as_bytes(), std_tx.to_bytes().as_slice());
        assert_eq!(tx.hash_hex().len(), 64);
        assert_eq!(tx.hash_bytes().len(), 32);
        assert_eq!(tx.hash(), Tx::from(&std_tx).hash());
        assert_eq!(StdTx::try_from(&tx).unwrap(), std_tx);
    }

    proptest! {
        #[test]
        fn sign_bytes_are_deterministic(
            account_number in any::<u64>(),
            sequence in any::<u64>(),
            amount in 1u64..,
            gas in any::<u64>(),
            memo in "[a-z ]{0,32}",
            symbol in "[A-Z]{1,8}",
        ) {
            let from = Signer::public_key(&key(10));
            let build = || StdSignMsg {
                chain_id: "test-chain".to_string(),
                account_number,
                sequence,
                memo: memo.clone(),
                fee: StdFee::new(gas, Coin::new("BNB", amount)),
                msgs: vec![
                    Msg::burn_token(from.clone(), symbol.clone(), amount).unwrap(),
                    Msg::freeze_token(from.clone(), symbol.clone(), amount).unwrap(),
                ],
                source: 0,
            };
            let first = build().sign_bytes().unwrap();
            let second = build().sign_bytes().unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
