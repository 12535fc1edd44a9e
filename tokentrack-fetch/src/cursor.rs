//! Per-chain fetch cursor used by resume mode.
//!
//! The default fetch looks at a fixed trailing window and keeps no memory of
//! earlier runs. In resume mode the last block covered by a successful fetch
//! is recorded, and the next run starts right after it unless that is older
//! than the configured window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last block covered by a successful fetch of one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Highest block whose transfers have been written.
    pub last_block: u64,
    /// When that fetch finished.
    pub fetched_at: DateTime<Utc>,
}

impl Cursor {
    /// A cursor at `last_block`, stamped with the current time.
    #[must_use]
    pub fn now(last_block: u64) -> Self {
        Self {
            last_block,
            fetched_at: Utc::now(),
        }
    }

    /// First block the next fetch should cover.
    #[must_use]
    pub const fn next_block(&self) -> u64 {
        self.last_block.saturating_add(1)
    }
}
