use crate::transaction::{BroadcastMode, BroadcastOptions};
use commonware_codec::DecodeExt;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_utils::{from_hex_formatted, hex};
use dexkit_types::{
    msg::MAX_SYMBOL_LENGTH,
    tx::{MAX_CHAIN_ID_LENGTH, MAX_MEMO_LENGTH},
    Coin, StdFee,
};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};
use thiserror::Error;
use tracing::Level;

const DEFAULT_FEE_DENOM: &str = "BNB";
const DEFAULT_FEE_AMOUNT: u64 = 5_000;
const DEFAULT_GAS: u64 = 200_000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Signing configuration, usually loaded from YAML.
#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    pub private_key: HexBytes,
    pub chain_id: String,

    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,
    #[serde(default = "default_fee_amount")]
    pub fee_amount: u64,
    #[serde(default = "default_gas")]
    pub gas: u64,

    #[serde(default)]
    pub account_number: u64,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub source: u64,
    #[serde(default)]
    pub mode: BroadcastMode,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("{field} can't be empty")]
    Empty { field: &'static str },
    #[error("{field} is too long: {len} bytes (max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
}

pub struct ValidatedConfig {
    pub signer: PrivateKey,
    pub public_key: PublicKey,
    pub chain_id: String,
    pub fee: StdFee,
    pub options: BroadcastOptions,
    pub log_level: Level,
}

struct RedactedConfig<'a>(&'a Config);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        f.debug_struct("Config")
            .field("private_key", &"<redacted>")
            .field("chain_id", &cfg.chain_id)
            .field("fee_denom", &cfg.fee_denom)
            .field("fee_amount", &cfg.fee_amount)
            .field("gas", &cfg.gas)
            .field("account_number", &cfg.account_number)
            .field("sequence", &cfg.sequence)
            .field("memo", &cfg.memo)
            .field("source", &cfg.source)
            .field("mode", &cfg.mode)
            .field("log_level", &cfg.log_level)
            .finish()
    }
}

fn default_fee_denom() -> String {
    DEFAULT_FEE_DENOM.to_string()
}

fn default_fee_amount() -> u64 {
    DEFAULT_FEE_AMOUNT
}

fn default_gas() -> u64 {
    DEFAULT_GAS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn ensure_bounded(field: &'static str, value: &str, max: usize) -> Result<(), ConfigError> {
    if value.len() > max {
        return Err(ConfigError::TooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }

    pub fn parse_signer(&self) -> Result<PrivateKey, ConfigError> {
        PrivateKey::decode(self.private_key.as_ref()).map_err(|source| {
            ConfigError::InvalidDecode {
                field: "private_key",
                value: "<redacted>".to_string(),
                source,
            }
        })
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let signer = self.parse_signer()?;
        if self.chain_id.is_empty() {
            return Err(ConfigError::Empty { field: "chain_id" });
        }
        ensure_bounded("chain_id", &self.chain_id, MAX_CHAIN_ID_LENGTH)?;
        ensure_bounded("memo", &self.memo, MAX_MEMO_LENGTH)?;
        if self.fee_denom.is_empty() {
            return Err(ConfigError::Empty { field: "fee_denom" });
        }
        ensure_bounded("fee_denom", &self.fee_denom, MAX_SYMBOL_LENGTH)?;
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        let public_key = signer.public_key();
        Ok(ValidatedConfig {
            signer,
            public_key,
            fee: StdFee::new(self.gas, Coin::new(self.fee_denom, self.fee_amount)),
            options: BroadcastOptions {
                account_number: self.account_number,
                sequence: self.sequence,
                memo: self.memo,
                source: self.source,
                mode: self.mode,
            },
            chain_id: self.chain_id,
            log_level,
        })
    }
}
