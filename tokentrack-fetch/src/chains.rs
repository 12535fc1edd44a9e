//! Resolved per-chain fetch configuration.
//!
//! A [`ChainConfig`] is built once, before any fetch runs, from the built-in
//! [`Chain`] defaults plus whatever [`crate::config::Config`] overrides. The
//! orchestrator only ever sees this value; it never reads configuration
//! from the environment on its own.

use alloy::primitives::Address;
use tokentrack::{Chain, DEFAULT_DECIMALS};

/// Everything needed to fetch one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Which chain this is.
    pub chain: Chain,
    /// JSON-RPC HTTP endpoint.
    pub rpc_endpoint: String,
    /// ERC-20 contract whose `Transfer` events are collected.
    pub token_address: Address,
    /// Width of the trailing block window queried per run.
    pub lookback_blocks: u64,
    /// Decimal exponent used to scale raw amounts.
    pub decimals: u8,
}

impl ChainConfig {
    /// The built-in configuration for `chain`.
    #[must_use]
    pub fn builtin(chain: Chain) -> Self {
        Self {
            chain,
            rpc_endpoint: chain.default_rpc().to_owned(),
            token_address: chain.default_token(),
            lookback_blocks: chain.default_lookback(),
            decimals: DEFAULT_DECIMALS,
        }
    }

    /// Symbolic chain identifier (`eth`, `polygon`, `bnb`).
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.chain.id()
    }
}

/// Built-in configuration for every supported chain.
#[must_use]
pub fn builtin_all() -> Vec<ChainConfig> {
    Chain::ALL.iter().copied().map(ChainConfig::builtin).collect()
}
