//! Cross-chain ERC-20 transfer fetcher.
//!
//! Pulls `Transfer` logs for one token per chain over JSON-RPC, decodes them
//! with [`tokentrack`], and stores each chain's records as a Parquet file.
//!
//! ```no_run
//! use tokentrack::Chain;
//! use tokentrack_fetch::{ChainConfig, FetchOptions, Store, fetch_chain_blocking};
//!
//! let chain = ChainConfig::builtin(Chain::Polygon);
//! let store = Store::new("data");
//! let outcome = fetch_chain_blocking(&chain, &store, FetchOptions::default())?;
//! println!("wrote {} transfers", outcome.written());
//! # Ok::<(), tokentrack_fetch::FetchError>(())
//! ```

pub mod chains;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fetcher;
pub mod rpc;
pub mod store;
pub mod summary;

pub use chains::ChainConfig;
pub use config::Config;
pub use error::{FetchError, StoreError};
pub use fetcher::{
    BlockRange, FetchOptions, FetchOutcome, WindowMode, fetch, fetch_chain, fetch_chain_blocking,
};
pub use store::Store;
