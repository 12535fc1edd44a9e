//! Core domain types: the raw `eth_getLogs` entry and the decoded transfer.

use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, B256, U256, b256};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// `keccak256("Transfer(address,address,uint256)")`, identical on every EVM chain.
pub const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Decimal exponent of the tracked token.
pub const DEFAULT_DECIMALS: u8 = 6;

/// One entry of an `eth_getLogs` result, as it appears on the wire.
///
/// Only the fields the decoder needs are kept; everything else in the JSON
/// object is ignored. Values stay as strings until [`crate::decode`] checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Hash of the emitting transaction.
    pub transaction_hash: String,
    /// Hex-encoded block number.
    pub block_number: String,
    /// Signature topic followed by the indexed parameters.
    pub topics: Vec<String>,
    /// ABI-encoded non-indexed parameters.
    pub data: String,
}

/// A decoded ERC-20 transfer.
///
/// Several records may share a `tx_hash` when one transaction emits more
/// than one `Transfer` event.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    /// Hash of the emitting transaction.
    pub tx_hash: B256,
    /// Block the log was included in.
    pub block_number: u64,
    /// Sender (first indexed parameter).
    pub from: Address,
    /// Recipient (second indexed parameter).
    pub to: Address,
    /// Amount in token base units, exactly as emitted.
    pub raw_value: U256,
    /// Amount scaled by the token's decimal exponent.
    pub value: f64,
}

impl TransferRecord {
    /// Build a record, deriving [`TransferRecord::value`] from `raw_value`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Units`] if `decimals` is out of range for a `uint256`.
    pub fn new(
        tx_hash: B256,
        block_number: u64,
        from: Address,
        to: Address,
        raw_value: U256,
        decimals: u8,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            tx_hash,
            block_number,
            from,
            to,
            raw_value,
            value: scale(raw_value, decimals)?,
        })
    }
}

/// Divide a base-unit amount by `10^decimals`.
///
/// # Errors
///
/// Returns [`DecodeError::Units`] if `decimals` exceeds the `uint256` range.
pub fn scale(raw: U256, decimals: u8) -> Result<f64, DecodeError> {
    let text = format_units(raw, decimals).map_err(|e| DecodeError::Units(e.to_string()))?;
    text.parse::<f64>().map_err(|e| DecodeError::Units(format!("{text}: {e}")))
}

#[cfg(test)]
mod tests {
    use alloy::primitives::keccak256;

    use super::*;

    #[test]
    fn transfer_topic_is_the_event_signature_hash() {
        assert_eq!(
            keccak256("Transfer(address,address,uint256)"),
            TRANSFER_TOPIC,
            "signature hash"
        );
    }

    #[test]
    fn scale_uses_decimals() {
        let one = scale(U256::from(1_000_000u64), DEFAULT_DECIMALS).unwrap_or_default();
        assert!((one - 1.0).abs() < f64::EPSILON, "got {one}");

        let cent = scale(U256::from(10_000u64), DEFAULT_DECIMALS).unwrap_or_default();
        assert!((cent - 0.01).abs() < f64::EPSILON, "got {cent}");

        let whole = scale(U256::from(42u64), 0).unwrap_or_default();
        assert!((whole - 42.0).abs() < f64::EPSILON, "got {whole}");
    }

    #[test]
    fn scale_rejects_absurd_decimals() {
        assert!(scale(U256::from(1u64), 200).is_err(), "200 decimals");
    }

    #[test]
    fn raw_log_ignores_extra_fields() {
        let json = serde_json::json!({
            "address": "0xdac17f958d2ee523a2206206994597c13d831ec7",
            "transactionHash": "0x01",
            "blockNumber": "0x10",
            "topics": [],
            "data": "0x",
            "logIndex": "0x0",
            "removed": false
        });
        let log: Result<RawLog, _> = serde_json::from_value(json);
        assert!(log.is_ok(), "{log:?}");
    }
}
