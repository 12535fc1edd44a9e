//! Fault taxonomy for fetching and storing transfers.
//!
//! A failed fetch, an empty window and a chain that was never fetched are
//! three different things to a caller: the first is an `Err(FetchError)`, the
//! second an `Ok` outcome with nothing written, and the third
//! [`StoreError::NotFound`] on load.

use std::path::PathBuf;

use alloy::rpc::json_rpc::ErrorPayload;
use tokentrack::Chain;

/// Why a chain's fetch was aborted. Stored data is never modified when one
/// of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The endpoint could not be reached, timed out, or answered with
    /// something that is not a JSON-RPC response.
    #[error("transport: {0}")]
    Transport(String),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("rpc: {0}")]
    Rpc(ErrorPayload),

    /// A JSON-RPC result did not have the expected shape.
    #[error("{method} returned an unexpected result: {result}")]
    Malformed {
        /// The method whose result was rejected.
        method: &'static str,
        /// The offending result, as JSON text.
        result: String,
    },

    /// The decoded records could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The private runtime behind the blocking entry point failed to start.
    #[error("starting runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Errors raised by [`crate::store::Store`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing has been persisted for this chain yet.
    #[error("no stored transfers for chain {0}")]
    NotFound(Chain),

    /// Filesystem failure.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Arrow rejected the columns.
    #[error("arrow: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// The Parquet writer or reader failed.
    #[error("parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The file exists but does not hold transfer rows.
    #[error("{}: {reason}", path.display())]
    Corrupt {
        /// File being read.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The cursor could not be serialized.
    #[error("cursor {}: {source}", path.display())]
    Cursor {
        /// Cursor file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
