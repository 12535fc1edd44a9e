//! Supported chains and the token contract tracked on each of them.
//!
//! Every chain has a short symbolic identifier (`eth`, `polygon`, `bnb`) used
//! for file names, configuration keys and the CLI, plus built-in defaults that
//! a configuration file may override.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// USDT on Ethereum mainnet.
const ETHEREUM_TOKEN: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
/// USDT on Polygon PoS.
const POLYGON_TOKEN: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
/// Binance-Peg USDT on BNB Smart Chain.
const BSC_TOKEN: Address = address!("55d398326f99059fF775485246999027B3197955");

/// An EVM chain the tracker knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Chain {
    /// Ethereum mainnet (`eth`, chain ID 1).
    #[serde(rename = "eth")]
    Ethereum,
    /// Polygon PoS mainnet (`polygon`, chain ID 137).
    #[serde(rename = "polygon")]
    Polygon,
    /// BNB Smart Chain mainnet (`bnb`, chain ID 56).
    #[serde(rename = "bnb")]
    Bsc,
}

impl Chain {
    /// All supported chains, in the order a full fetch visits them.
    pub const ALL: &[Self] = &[Self::Ethereum, Self::Polygon, Self::Bsc];

    /// Symbolic identifier used for storage keys and configuration.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Ethereum => "eth",
            Self::Polygon => "polygon",
            Self::Bsc => "bnb",
        }
    }

    /// Returns the EIP-155 chain ID.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Polygon => 137,
            Self::Bsc => 56,
        }
    }

    /// Token contract tracked on this chain unless configured otherwise.
    #[must_use]
    pub const fn default_token(self) -> Address {
        match self {
            Self::Ethereum => ETHEREUM_TOKEN,
            Self::Polygon => POLYGON_TOKEN,
            Self::Bsc => BSC_TOKEN,
        }
    }

    /// Suggested public RPC endpoint.
    #[must_use]
    pub const fn default_rpc(self) -> &'static str {
        match self {
            Self::Ethereum => "https://ethereum-rpc.publicnode.com",
            Self::Polygon => "https://polygon-bor.publicnode.com",
            Self::Bsc => "https://bsc.publicnode.com",
        }
    }

    /// Size of the trailing block window queried per run.
    ///
    /// Polygon produces blocks several times faster than the others, so it
    /// gets a ten times wider window.
    #[must_use]
    pub const fn default_lookback(self) -> u64 {
        match self {
            Self::Polygon => 1000,
            Self::Ethereum | Self::Bsc => 100,
        }
    }

    /// Look up a [`Chain`] by its symbolic identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().find(|c| c.id() == id).copied()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when parsing an identifier that names no supported chain.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown chain `{0}` (expected one of: eth, polygon, bnb)")]
pub struct UnknownChain(pub String);

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(&s.to_ascii_lowercase()).ok_or_else(|| UnknownChain(s.to_owned()))
    }
}
