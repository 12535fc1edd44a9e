//! ERC-20 `Transfer` log decoding for the tokentrack fetcher.
//!
//! This crate holds the I/O-free half of tokentrack: the supported
//! [`Chain`]s, the raw log wire type, the [`decode`] step that turns an
//! `eth_getLogs` entry into a [`TransferRecord`], and [`DecodeError`].
//!
//! ```
//! use tokentrack::{DEFAULT_DECIMALS, RawLog, TRANSFER_TOPIC, decode};
//!
//! let raw = RawLog {
//!     transaction_hash: format!("0x{}", "11".repeat(32)),
//!     block_number: "0x3b6".to_owned(),
//!     topics: vec![
//!         format!("{TRANSFER_TOPIC:#x}"),
//!         format!("0x{}{}", "00".repeat(12), "aa".repeat(20)),
//!         format!("0x{}{}", "00".repeat(12), "bb".repeat(20)),
//!     ],
//!     data: "0x2710".to_owned(),
//! };
//!
//! let record = decode(&raw, DEFAULT_DECIMALS).unwrap();
//! assert_eq!(record.block_number, 950);
//! assert_eq!(record.value, 0.01);
//! ```

pub mod decode;
pub mod error;
pub mod networks;
pub mod types;

pub use decode::{Decoded, decode, decode_batch, decode_value};
pub use error::DecodeError;
pub use networks::{Chain, UnknownChain};
pub use types::{DEFAULT_DECIMALS, RawLog, TRANSFER_TOPIC, TransferRecord, scale};
