//! Aggregate views over stored transfers.

use std::collections::BTreeMap;

use tokentrack::TransferRecord;

/// Totals over a set of transfers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Number of transfers.
    pub transfers: usize,
    /// Sum of scaled amounts.
    pub volume: f64,
    /// Sum of scaled amounts per block, ascending by block.
    pub by_block: BTreeMap<u64, f64>,
}

/// Summarize `records`.
#[must_use]
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a TransferRecord>) -> Summary {
    let mut summary = Summary::default();
    for record in records {
        summary.transfers += 1;
        summary.volume += record.value;
        *summary.by_block.entry(record.block_number).or_default() += record.value;
    }
    summary
}

/// Whether `record`'s sender or recipient contains `needle` (case-insensitive).
///
/// Accepts a full address or any fragment of one, with or without `0x`.
#[must_use]
pub fn matches_address(record: &TransferRecord, needle: &str) -> bool {
    let needle = needle.to_ascii_lowercase();
    let needle = needle.strip_prefix("0x").unwrap_or(&needle);
    [record.from, record.to]
        .iter()
        .any(|a| format!("{a:x}").contains(needle))
}
