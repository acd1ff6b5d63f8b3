#![cfg(test)]
use crate::msg::Msg;
use crate::tx::{sign, Coin, StdFee, StdSignMsg};
use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PrivateKey, Signer};

#[test]
fn coin_encoding_is_stable() {
    assert_eq!(
        Coin::new("BNB", 5000).encode().as_ref(),
        &[0u8, 0, 0, 3, b'B', b'N', b'B', 0, 0, 0, 0, 0, 0, 0x13, 0x88]
    );
}

#[test]
fn fee_encoding_is_stable() {
    let fee = StdFee::new(200_000, Coin::new("BNB", 1));
    assert_eq!(
        fee.encode().as_ref(),
        &[
            0u8, 0, 0, 1, // coin count
            0, 0, 0, 3, b'B', b'N', b'B', // denom
            0, 0, 0, 0, 0, 0, 0, 1, // amount
            0, 0, 0, 0, 0, 0x03, 0x0d, 0x40, // gas
        ]
    );
}

#[test]
fn token_burn_encoding_is_stable() {
    let from = PrivateKey::from_seed(1).public_key();
    let msg = Msg::burn_token(from.clone(), "NNB", 100).unwrap();
    let encoded = msg.encode();

    let mut expected = vec![3u8];
    expected.extend_from_slice(from.as_ref());
    expected.extend_from_slice(&[0, 0, 0, 3, b'N', b'N', b'B']);
    expected.extend_from_slice(&100u64.to_be_bytes());
    assert_eq!(encoded.as_ref(), expected.as_slice());
}

#[test]
fn sign_bytes_layout_is_stable() {
    let from = PrivateKey::from_seed(1).public_key();
    let msg = Msg::list_pair(from, 7, "BNB", "NNB", 100_000_000).unwrap();
    let envelope = StdSignMsg {
        chain_id: "test-chain".to_string(),
        account_number: 42,
        sequence: 1,
        memo: String::new(),
        fee: StdFee::new(5000, Coin::new("BNB", 5000)),
        msgs: vec![msg.clone()],
        source: 0,
    };
    let bytes = envelope.sign_bytes().unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&[0, 0, 0, 10]);
    expected.extend_from_slice(b"test-chain");
    expected.extend_from_slice(&42u64.to_be_bytes());
    expected.extend_from_slice(&1u64.to_be_bytes());
    expected.extend_from_slice(envelope.fee.encode().as_ref());
    expected.extend_from_slice(&[0, 0, 0, 0]);
    expected.extend_from_slice(&[0, 0, 0, 1]);
    expected.extend_from_slice(msg.encode().as_ref());
    expected.extend_from_slice(&0u64.to_be_bytes());
    assert_eq!(bytes, expected);
}

#[test]
fn signatures_are_reproducible() {
    let signer = PrivateKey::from_seed(1);
    let envelope = StdSignMsg {
        chain_id: "test-chain".to_string(),
        account_number: 42,
        sequence: 1,
        memo: String::new(),
        fee: StdFee::new(5000, Coin::new("BNB", 5000)),
        msgs: vec![Msg::burn_token(signer.public_key(), "NNB", 1).unwrap()],
        source: 0,
    };
    let first = sign(&signer, &envelope).unwrap();
    let second = sign(&signer, &envelope.clone()).unwrap();
    assert_eq!(first, second);
}
