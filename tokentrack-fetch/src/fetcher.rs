//! Per-chain fetch orchestration.
//!
//! For each chain the fetcher:
//! 1. Asks the endpoint for the latest block and derives the block window.
//! 2. Queries `eth_getLogs` for the token's `Transfer` events in that window.
//! 3. Decodes every log, setting malformed entries aside.
//! 4. Hands the records to the [`Store`]. A window with no transfers leaves
//!    stored data untouched.
//!
//! A fault at any step aborts the chain before anything is written. Chains
//! share no state, so they can be fetched in any order or concurrently.

use std::time::Duration;

use alloy::providers::Provider;
use tokentrack::{DecodeError, Decoded, decode_batch};

use crate::chains::ChainConfig;
use crate::cursor::Cursor;
use crate::error::FetchError;
use crate::rpc;
use crate::store::Store;

/// How the block window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    /// `[latest - lookback, latest]` every run; stored rows are replaced and
    /// the cursor moves to the end of the window.
    #[default]
    Trailing,
    /// Continue after the stored cursor, but never further back than the
    /// trailing window; new rows are appended.
    Resume,
}

/// Knobs shared by every chain in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on each JSON-RPC round trip.
    pub timeout: Duration,
    /// Window selection.
    pub mode: WindowMode,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: rpc::DEFAULT_TIMEOUT,
            mode: WindowMode::Trailing,
        }
    }
}

/// Inclusive block range queried by one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// First block.
    pub from: u64,
    /// Last block.
    pub to: u64,
}

impl BlockRange {
    /// `[latest - lookback, latest]`, clamped at genesis.
    #[must_use]
    pub const fn trailing(latest: u64, lookback: u64) -> Self {
        Self {
            from: latest.saturating_sub(lookback),
            to: latest,
        }
    }

    /// Resume after `cursor`, bounded below by the trailing window.
    ///
    /// Returns `None` when the cursor already covers `latest`.
    #[must_use]
    pub fn resume(latest: u64, lookback: u64, cursor: Option<Cursor>) -> Option<Self> {
        let window = Self::trailing(latest, lookback);
        let from = cursor.map_or(window.from, |c| c.next_block().max(window.from));
        (from <= latest).then_some(Self { from, to: latest })
    }
}

/// What a successful fetch did.
#[derive(Debug)]
pub enum FetchOutcome {
    /// No transfers were decoded; stored rows were left as they were.
    Empty {
        /// The window queried, or `None` if resume mode had nothing new to ask for.
        range: Option<BlockRange>,
        /// Logs that failed to decode, by position in the RPC result.
        failures: Vec<(usize, DecodeError)>,
    },
    /// Records were decoded and persisted.
    Written {
        /// The window queried.
        range: BlockRange,
        /// Number of records written by this fetch.
        records: usize,
        /// Logs that failed to decode, by position in the RPC result.
        failures: Vec<(usize, DecodeError)>,
    },
}

impl FetchOutcome {
    /// Number of records this fetch wrote.
    #[must_use]
    pub const fn written(&self) -> usize {
        match self {
            Self::Empty { .. } => 0,
            Self::Written { records, .. } => *records,
        }
    }

    /// The window queried, if any.
    #[must_use]
    pub const fn range(&self) -> Option<BlockRange> {
        match self {
            Self::Empty { range, .. } => *range,
            Self::Written { range, .. } => Some(*range),
        }
    }

    /// Logs that were skipped because they failed to decode.
    #[must_use]
    pub fn failures(&self) -> &[(usize, DecodeError)] {
        match self {
            Self::Empty { failures, .. } | Self::Written { failures, .. } => failures,
        }
    }
}

/// Fetch one chain through `provider` and persist the result in `store`.
///
/// # Errors
///
/// Returns a [`FetchError`] if either RPC call fails or returns something
/// unexpected, or if the records cannot be stored. Stored rows are unchanged
/// in every error case except a cursor write failing after the rows were
/// saved.
pub async fn fetch<P: Provider>(
    provider: &P,
    chain: &ChainConfig,
    store: &Store,
    opts: FetchOptions,
) -> Result<FetchOutcome, FetchError> {
    let id = chain.id();
    let latest = rpc::block_number(provider, opts.timeout).await?;

    let range = match opts.mode {
        WindowMode::Trailing => BlockRange::trailing(latest, chain.lookback_blocks),
        WindowMode::Resume => {
            let cursor = store.load_cursor(chain.chain)?;
            let Some(range) = BlockRange::resume(latest, chain.lookback_blocks, cursor) else {
                tracing::info!(chain = id, latest, "already up to date");
                return Ok(FetchOutcome::Empty {
                    range: None,
                    failures: Vec::new(),
                });
            };
            range
        }
    };

    tracing::info!(chain = id, from = range.from, to = range.to, "querying transfer logs");

    let filter = rpc::transfer_filter(chain.token_address, range.from, range.to);
    let logs = rpc::get_logs(provider, &filter, opts.timeout).await?;
    let Decoded { records, failures } = decode_batch(&logs, chain.decimals);

    for (index, error) in &failures {
        tracing::warn!(chain = id, index, %error, "skipping malformed log");
    }

    if records.is_empty() {
        if opts.mode == WindowMode::Resume {
            store.save_cursor(chain.chain, &Cursor::now(range.to))?;
        }
        tracing::info!(chain = id, logs = logs.len(), "no transfers in window, stored data kept");
        return Ok(FetchOutcome::Empty {
            range: Some(range),
            failures,
        });
    }

    let count = records.len();
    match opts.mode {
        WindowMode::Trailing => {
            // The file now covers exactly this window, so a later resume
            // must continue after it rather than after an older cursor.
            store.save(chain.chain, &records)?;
            store.save_cursor(chain.chain, &Cursor::now(range.to))?;
        }
        WindowMode::Resume => {
            let total = store.append(chain.chain, records, chain.decimals)?;
            store.save_cursor(chain.chain, &Cursor::now(range.to))?;
            tracing::debug!(chain = id, total, "appended");
        }
    }

    tracing::info!(
        chain = id,
        records = count,
        skipped = failures.len(),
        path = %store.transfers_path(chain.chain).display(),
        "saved transfers"
    );

    Ok(FetchOutcome::Written {
        range,
        records: count,
        failures,
    })
}

/// Connect to the chain's configured endpoint and [`fetch`] it.
///
/// # Errors
///
/// See [`fetch`]; an invalid endpoint URL is a [`FetchError::Transport`].
pub async fn fetch_chain(
    chain: &ChainConfig,
    store: &Store,
    opts: FetchOptions,
) -> Result<FetchOutcome, FetchError> {
    tracing::debug!(chain = chain.id(), rpc = %chain.rpc_endpoint, "connecting");
    let provider = rpc::connect(&chain.rpc_endpoint)?;
    fetch(&provider, chain, store, opts).await
}

/// [`fetch_chain`] for synchronous callers.
///
/// Runs the fetch to completion on a private single-threaded runtime. Must
/// not be called from inside an async context.
///
/// # Errors
///
/// See [`fetch_chain`], plus [`FetchError::Runtime`] if the runtime cannot
/// be created.
pub fn fetch_chain_blocking(
    chain: &ChainConfig,
    store: &Store,
    opts: FetchOptions,
) -> Result<FetchOutcome, FetchError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(FetchError::Runtime)?
        .block_on(fetch_chain(chain, store, opts))
}
