//! Required-network descriptor and canonical chain identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// EDU Chain Testnet (656476).
pub const EDU_TESTNET_CHAIN_ID: u64 = 0xa045c;
pub const EDU_TESTNET_NAME: &str = "EDU Chain Testnet";
pub const EDU_TESTNET_RPC_URL: &str = "https://rpc.open-campus-codex.gelato.digital";
pub const EDU_TESTNET_EXPLORER_URL: &str = "https://edu-chain-testnet.blockscout.com";

/// Canonical chain identifier.
///
/// Providers report chain ids as hex strings with inconsistent casing and
/// occasional leading zeros, so ids are compared numerically and always
/// rendered as lowercase minimal `0x` hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// `0x`-prefixed lowercase hex, as EIP-1193 expects.
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chain id '{0}': expected 0x-prefixed hex or decimal")]
pub struct ChainIdParseError(String);

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.contains(['+', '-']) {
            return Err(ChainIdParseError(raw.to_string()));
        }
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) if !hex.is_empty() => u64::from_str_radix(hex, 16).ok(),
            Some(_) => None,
            None if !trimmed.is_empty() => trimmed.parse::<u64>().ok(),
            None => None,
        };
        parsed
            .map(Self)
            .ok_or_else(|| ChainIdParseError(raw.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Native currency of the required network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The single network the wallet must be on before chain interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequirement {
    pub chain_id: ChainId,
    pub display_name: String,
    pub rpc_endpoints: Vec<Url>,
    pub native_currency: NativeCurrency,
    pub explorer_urls: Vec<Url>,
}

impl NetworkRequirement {
    /// EDU Chain Testnet, the network the campus contracts are deployed to.
    pub fn edu_testnet() -> Self {
        Self {
            chain_id: ChainId::new(EDU_TESTNET_CHAIN_ID),
            display_name: EDU_TESTNET_NAME.to_string(),
            rpc_endpoints: Url::parse(EDU_TESTNET_RPC_URL).into_iter().collect(),
            native_currency: NativeCurrency {
                name: "EDU".to_string(),
                symbol: "EDU".to_string(),
                decimals: 18,
            },
            explorer_urls: Url::parse(EDU_TESTNET_EXPLORER_URL).into_iter().collect(),
        }
    }

    /// Descriptor handed to the wallet when it has to register the network.
    pub fn add_chain_parameters(&self) -> AddChainParameters {
        AddChainParameters {
            chain_id: self.chain_id,
            chain_name: self.display_name.clone(),
            rpc_urls: self.rpc_endpoints.iter().map(url_string).collect(),
            native_currency: self.native_currency.clone(),
            block_explorer_urls: self.explorer_urls.iter().map(url_string).collect(),
        }
    }

    pub fn matches(&self, active: ChainId) -> bool {
        self.chain_id == active
    }
}

impl Default for NetworkRequirement {
    fn default() -> Self {
        Self::edu_testnet()
    }
}

/// `wallet_addEthereumChain` parameter object (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParameters {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

// `Url` always renders a trailing slash on bare origins; wallets compare the
// RPC list literally, so strip it back off.
fn url_string(url: &Url) -> String {
    let raw = url.as_str();
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        raw.trim_end_matches('/').to_string()
    } else {
        raw.to_string()
    }
}
