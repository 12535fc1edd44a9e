//! Runtime configuration loaded from `config.toml`.
//!
//! Every field is optional. A chain without a `[chains.<id>]` table keeps its
//! built-in endpoint, token, window and decimals.
//!
//! ```toml
//! request_timeout_secs = 15
//!
//! [chains.eth]
//! rpc = "https://mainnet.infura.io/v3/<key>"
//!
//! [chains.polygon]
//! lookback_blocks = 2000
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use tokentrack::Chain;

use crate::chains::ChainConfig;
use crate::rpc::DEFAULT_TIMEOUT;

/// Largest decimal exponent a `uint256` amount can be scaled by.
const MAX_DECIMALS: u8 = 77;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Upper bound on each JSON-RPC round trip, in seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Per-chain overrides, keyed by symbolic chain id.
    #[serde(default)]
    pub chains: HashMap<String, ChainOverrides>,
}

/// Overrides for a single chain. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainOverrides {
    /// JSON-RPC endpoint.
    pub rpc: Option<String>,
    /// Token contract address.
    pub token: Option<Address>,
    /// Trailing window size in blocks.
    pub lookback_blocks: Option<u64>,
    /// Token decimal exponent.
    pub decimals: Option<u8>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Returns [`Config::default`] if the file does not exist,
    /// allowing the binary to work without any config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML, unknown keys, unknown chain ids or
    /// a `decimals` value above 77.
    pub fn parse(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        for (id, overrides) in &cfg.chains {
            id.parse::<Chain>()?;
            if let Some(decimals) = overrides.decimals {
                ensure!(
                    decimals <= MAX_DECIMALS,
                    "chains.{id}.decimals = {decimals} exceeds the maximum of {MAX_DECIMALS}"
                );
            }
        }
        Ok(cfg)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
    }

    /// Resolve the effective configuration for one chain.
    #[must_use]
    pub fn resolve(&self, chain: Chain) -> ChainConfig {
        let mut cfg = ChainConfig::builtin(chain);
        if let Some(o) = self.chains.get(chain.id()) {
            if let Some(rpc) = &o.rpc {
                cfg.rpc_endpoint.clone_from(rpc);
            }
            if let Some(token) = o.token {
                cfg.token_address = token;
            }
            if let Some(lookback) = o.lookback_blocks {
                cfg.lookback_blocks = lookback;
            }
            if let Some(decimals) = o.decimals {
                cfg.decimals = decimals;
            }
        }
        cfg
    }

    /// Resolve every supported chain, in fetch order.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<ChainConfig> {
        Chain::ALL.iter().map(|c| self.resolve(*c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn empty_config_is_builtin() {
        let cfg = Config::parse("").unwrap_or_default();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10), "default timeout");
        assert_eq!(
            cfg.resolve(Chain::Ethereum),
            ChainConfig::builtin(Chain::Ethereum),
            "no overrides"
        );
    }

    #[test]
    fn overrides_apply_per_chain() {
        let text = r#"
            request_timeout_secs = 3

            [chains.bnb]
            rpc = "http://localhost:8545"
            token = "0x1111111111111111111111111111111111111111"
            lookback_blocks = 5
            decimals = 18
        "#;
        let cfg = Config::parse(text).unwrap_or_default();

        assert_eq!(cfg.request_timeout(), Duration::from_secs(3), "timeout");
        let bnb = cfg.resolve(Chain::Bsc);
        assert_eq!(bnb.rpc_endpoint, "http://localhost:8545", "rpc");
        assert_eq!(
            bnb.token_address,
            address!("1111111111111111111111111111111111111111"),
            "token"
        );
        assert_eq!(bnb.lookback_blocks, 5, "window");
        assert_eq!(bnb.decimals, 18, "decimals");
        assert_eq!(
            cfg.resolve(Chain::Polygon),
            ChainConfig::builtin(Chain::Polygon),
            "other chains untouched"
        );
    }

    #[test]
    fn unknown_chain_and_keys_are_rejected() {
        assert!(Config::parse("[chains.solana]\nrpc = \"x\"").is_err(), "unknown chain");
        assert!(Config::parse("[chains.eth]\nendpoint = \"x\"").is_err(), "unknown key");
    }

    #[test]
    fn decimals_beyond_uint256_are_rejected() {
        assert!(Config::parse("[chains.eth]\ndecimals = 77").is_ok(), "largest valid");
        let err = Config::parse("[chains.polygon]\ndecimals = 78");
        assert!(
            err.is_err_and(|e| e.to_string().contains("chains.polygon.decimals")),
            "rejected with the offending key"
        );
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("tokentrack-no-such-config.toml");
        let cfg = Config::load(&path);
        assert!(cfg.is_ok_and(|c| c.chains.is_empty()), "defaults");
    }
}
