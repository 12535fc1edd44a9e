//! Decoding of raw `Transfer` logs into [`TransferRecord`]s.
//!
//! `Transfer(address indexed from, address indexed to, uint256 value)` puts
//! the signature hash in `topics[0]`, the two addresses left-padded to 32
//! bytes in `topics[1]` and `topics[2]`, and the amount in `data`. The layout
//! is fixed by the ABI, so the same decoder serves every chain.

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;

use crate::error::DecodeError;
use crate::types::{RawLog, TRANSFER_TOPIC, TransferRecord};

/// Result of decoding a batch with per-record fault isolation.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Successfully decoded records, in input order.
    pub records: Vec<TransferRecord>,
    /// Position in the input and cause of every entry that failed to decode.
    pub failures: Vec<(usize, DecodeError)>,
}

/// Decode one raw log.
///
/// Pure: the same input always yields the same record.
///
/// # Errors
///
/// Returns a [`DecodeError`] if any field does not have the shape of an
/// ERC-20 `Transfer` log.
pub fn decode(raw: &RawLog, decimals: u8) -> Result<TransferRecord, DecodeError> {
    let tx_hash = parse_word("transactionHash", &raw.transaction_hash)?;
    let block_number = parse_block_number(&raw.block_number)?;

    let [signature, from, to] = raw.topics.as_slice() else {
        return Err(DecodeError::TopicCount(raw.topics.len()));
    };
    let signature = parse_word("topics[0]", signature)?;
    if signature != TRANSFER_TOPIC {
        return Err(DecodeError::WrongEvent(signature));
    }
    let from = Address::from_word(parse_word("topics[1]", from)?);
    let to = Address::from_word(parse_word("topics[2]", to)?);

    let raw_value = parse_amount(&raw.data)?;

    TransferRecord::new(tx_hash, block_number, from, to, raw_value, decimals)
}

/// Decode one JSON value from an `eth_getLogs` result.
///
/// # Errors
///
/// Returns [`DecodeError::Shape`] if the value is not a log object, otherwise
/// whatever [`decode`] returns.
pub fn decode_value(value: &serde_json::Value, decimals: u8) -> Result<TransferRecord, DecodeError> {
    let raw = RawLog::deserialize(value)?;
    decode(&raw, decimals)
}

/// Decode every entry of an `eth_getLogs` result.
///
/// A malformed entry never aborts the batch: it is reported in
/// [`Decoded::failures`] and the remaining entries are still decoded.
#[must_use]
pub fn decode_batch(values: &[serde_json::Value], decimals: u8) -> Decoded {
    let mut out = Decoded {
        records: Vec::with_capacity(values.len()),
        failures: Vec::new(),
    };
    for (i, value) in values.iter().enumerate() {
        match decode_value(value, decimals) {
            Ok(record) => out.records.push(record),
            Err(e) => out.failures.push((i, e)),
        }
    }
    out
}

/// Parse a `0x`-prefixed 32-byte hex word.
fn parse_word(field: &'static str, value: &str) -> Result<B256, DecodeError> {
    let invalid = || DecodeError::Word {
        field,
        value: value.to_owned(),
    };
    let digits = value.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() != 64 {
        return Err(invalid());
    }
    digits.parse::<B256>().map_err(|_| invalid())
}

/// Strip the `0x` prefix of a hex quantity, rejecting empty and oversized values.
fn quantity_digits<'a>(
    field: &'static str,
    value: &'a str,
    max_digits: usize,
) -> Result<&'a str, DecodeError> {
    match value.strip_prefix("0x") {
        Some(digits) if !digits.is_empty() && digits.len() <= max_digits => Ok(digits),
        _ => Err(DecodeError::Quantity {
            field,
            value: value.to_owned(),
        }),
    }
}

fn parse_block_number(value: &str) -> Result<u64, DecodeError> {
    let digits = quantity_digits("blockNumber", value, 16)?;
    u64::from_str_radix(digits, 16).map_err(|_| DecodeError::Quantity {
        field: "blockNumber",
        value: value.to_owned(),
    })
}

fn parse_amount(value: &str) -> Result<U256, DecodeError> {
    let digits = quantity_digits("data", value, 64)?;
    U256::from_str_radix(digits, 16).map_err(|_| DecodeError::Quantity {
        field: "data",
        value: value.to_owned(),
    })
}
