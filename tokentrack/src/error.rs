//! Error type for raw log decoding.

use alloy::primitives::B256;

/// A raw log that does not have the shape of an ERC-20 `Transfer` event.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The JSON object is missing a field or has a field of the wrong JSON type.
    #[error("malformed log object: {0}")]
    Shape(#[from] serde_json::Error),

    /// A field that must hold exactly 32 bytes of `0x`-prefixed hex does not.
    #[error("{field}: expected 0x-prefixed 32-byte hex, got `{value}`")]
    Word {
        /// Name of the offending field.
        field: &'static str,
        /// The value as received.
        value: String,
    },

    /// A field that must hold a `0x`-prefixed hex quantity does not, or overflows.
    #[error("{field}: invalid hex quantity `{value}`")]
    Quantity {
        /// Name of the offending field.
        field: &'static str,
        /// The value as received.
        value: String,
    },

    /// `Transfer(address,address,uint256)` carries exactly three topics.
    #[error("expected 3 topics, got {0}")]
    TopicCount(usize),

    /// `topics[0]` is not the `Transfer` event signature.
    #[error("not a Transfer event (topic0 {0:#x})")]
    WrongEvent(B256),

    /// The raw amount could not be scaled by the token's decimals.
    #[error("cannot scale amount: {0}")]
    Units(String),
}
