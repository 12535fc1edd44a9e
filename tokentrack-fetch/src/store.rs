//! Parquet persistence of transfer records, one file per chain.
//!
//! Layout:
//! ```text
//! <root>/<chain>/
//!   ├── transfers.parquet
//!   └── cursor.json        (resume mode only)
//! ```
//!
//! Amounts are stored as raw base-unit integers; scaling by the token's
//! decimals happens once, when rows are turned back into [`TransferRecord`]s.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use alloy::primitives::{Address, B256, U256};
use arrow_array::{Array, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tokentrack::{Chain, TransferRecord};

use crate::cursor::Cursor;
use crate::error::StoreError;

const TRANSFERS_FILE: &str = "transfers.parquet";
const CURSOR_FILE: &str = "cursor.json";

/// Column layout of a transfers file.
static TRANSFER_SCHEMA: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("tx_hash", DataType::Utf8, false),
        Field::new("block", DataType::UInt64, false),
        Field::new("from", DataType::Utf8, false),
        Field::new("to", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
    ]))
});

/// Durable per-chain storage rooted at a data directory.
///
/// Writes to different chains touch disjoint files. Concurrent writes to the
/// same chain must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// A store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one chain's files.
    #[must_use]
    pub fn chain_dir(&self, chain: Chain) -> PathBuf {
        self.root.join(chain.id())
    }

    /// Path of a chain's transfers file.
    #[must_use]
    pub fn transfers_path(&self, chain: Chain) -> PathBuf {
        self.chain_dir(chain).join(TRANSFERS_FILE)
    }

    /// Replace everything stored for `chain` with `records`, in order.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so readers see either the old rows or the new ones.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if Arrow/Parquet reject the data.
    pub fn save(&self, chain: Chain, records: &[TransferRecord]) -> Result<(), StoreError> {
        let batch = records_to_batch(records)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::try_new(3)?))
            .build();

        write_atomic(&self.transfers_path(chain), |file| {
            let mut writer = ArrowWriter::try_new(file, Arc::clone(&TRANSFER_SCHEMA), Some(props))?;
            writer.write(&batch)?;
            writer.close()?;
            Ok(())
        })?;

        tracing::debug!(chain = %chain, rows = records.len(), "transfers written");
        Ok(())
    }

    /// Load the rows last saved for `chain`, scaling amounts by `decimals`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if nothing was ever saved for `chain`.
    /// - [`StoreError::Corrupt`] if the file does not hold transfer rows.
    /// - I/O and Parquet errors otherwise.
    pub fn load(&self, chain: Chain, decimals: u8) -> Result<Vec<TransferRecord>, StoreError> {
        let path = self.transfers_path(chain);
        if !path.exists() {
            return Err(StoreError::NotFound(chain));
        }
        let file = File::open(&path).map_err(StoreError::io(&path))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        for batch in reader {
            batch_to_records(&batch?, decimals, &path, &mut records)?;
        }
        Ok(records)
    }

    /// Append `records` after the rows already stored for `chain`.
    ///
    /// Returns the total number of stored rows.
    ///
    /// # Errors
    ///
    /// Same as [`Store::load`] (except `NotFound`, which counts as empty)
    /// and [`Store::save`].
    pub fn append(
        &self,
        chain: Chain,
        records: Vec<TransferRecord>,
        decimals: u8,
    ) -> Result<usize, StoreError> {
        let mut all = match self.load(chain, decimals) {
            Ok(existing) => existing,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        all.extend(records);
        self.save(chain, &all)?;
        Ok(all.len())
    }

    /// Read the resume cursor for `chain`.
    ///
    /// Returns `None` if there is none yet, or if the file is unreadable as a
    /// cursor (logged, and treated as a fresh start).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_cursor(&self, chain: Chain) -> Result<Option<Cursor>, StoreError> {
        let path = self.chain_dir(chain).join(CURSOR_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path).map_err(StoreError::io(&path))?;
        match serde_json::from_str::<Cursor>(&data) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupted cursor, starting fresh");
                Ok(None)
            }
        }
    }

    /// Persist the resume cursor for `chain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be serialized or written.
    pub fn save_cursor(&self, chain: Chain, cursor: &Cursor) -> Result<(), StoreError> {
        let path = self.chain_dir(chain).join(CURSOR_FILE);
        let json = serde_json::to_vec_pretty(cursor).map_err(|source| StoreError::Cursor {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, |mut file| {
            std::io::Write::write_all(&mut file, &json).map_err(StoreError::io(&path))
        })
    }
}

/// Write `path` through a sibling `.tmp` file and rename it into place.
fn write_atomic(
    path: &Path,
    write: impl FnOnce(File) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
    }

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let file = File::create(&tmp).map_err(StoreError::io(&tmp))?;
    if let Err(e) = write(file) {
        std::fs::remove_file(&tmp).ok();
        return Err(e);
    }
    std::fs::rename(&tmp, path).map_err(StoreError::io(path))
}

fn records_to_batch(records: &[TransferRecord]) -> Result<RecordBatch, StoreError> {
    let hashes: Vec<String> = records.iter().map(|r| format!("{:#x}", r.tx_hash)).collect();
    let blocks: Vec<u64> = records.iter().map(|r| r.block_number).collect();
    let froms: Vec<String> = records.iter().map(|r| format!("{:#x}", r.from)).collect();
    let tos: Vec<String> = records.iter().map(|r| format!("{:#x}", r.to)).collect();
    let values: Vec<String> = records.iter().map(|r| r.raw_value.to_string()).collect();

    Ok(RecordBatch::try_new(
        Arc::clone(&TRANSFER_SCHEMA),
        vec![
            Arc::new(StringArray::from(hashes)),
            Arc::new(UInt64Array::from(blocks)),
            Arc::new(StringArray::from(froms)),
            Arc::new(StringArray::from(tos)),
            Arc::new(StringArray::from(values)),
        ],
    )?)
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a T, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StoreError::Corrupt {
            path: path.to_owned(),
            reason: format!("missing or mistyped column `{name}`"),
        })
}

fn batch_to_records(
    batch: &RecordBatch,
    decimals: u8,
    path: &Path,
    out: &mut Vec<TransferRecord>,
) -> Result<(), StoreError> {
    let hashes = column::<StringArray>(batch, "tx_hash", path)?;
    let blocks = column::<UInt64Array>(batch, "block", path)?;
    let froms = column::<StringArray>(batch, "from", path)?;
    let tos = column::<StringArray>(batch, "to", path)?;
    let values = column::<StringArray>(batch, "value", path)?;

    let corrupt = |row: usize, what: &str| StoreError::Corrupt {
        path: path.to_owned(),
        reason: format!("row {row}: {what}"),
    };

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let tx_hash = hashes
            .value(row)
            .parse::<B256>()
            .map_err(|_| corrupt(row, "bad tx_hash"))?;
        let from = froms
            .value(row)
            .parse::<Address>()
            .map_err(|_| corrupt(row, "bad from"))?;
        let to = tos
            .value(row)
            .parse::<Address>()
            .map_err(|_| corrupt(row, "bad to"))?;
        let raw_value = U256::from_str_radix(values.value(row), 10)
            .map_err(|_| corrupt(row, "bad value"))?;
        let record =
            TransferRecord::new(tx_hash, blocks.value(row), from, to, raw_value, decimals)
                .map_err(|e| corrupt(row, &e.to_string()))?;
        out.push(record);
    }
    Ok(())
}
