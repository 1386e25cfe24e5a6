//! Table codec: durable columnar storage via Parquet.
//!
//! `write` serializes a full `RecordBatch` to a Parquet file; `read` loads a
//! Parquet file back into a single `RecordBatch`, concatenating row groups.
//! The Arrow schema is embedded in the file metadata by `ArrowWriter`, so
//! column order, labels, and element types survive the round-trip exactly.

use std::fs::File;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use snafu::ResultExt;

use super::{ArrowSnafu, CodecResult, IoSnafu, ParquetSnafu};

/// Write `batch` to a Parquet file at `path`, replacing any existing file.
pub fn write(path: &Path, batch: &RecordBatch) -> CodecResult<()> {
    let display = path.display().to_string();
    let file = File::create(path).context(IoSnafu { path: &display })?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context(ParquetSnafu { path: &display })?;
    writer.write(batch).context(ParquetSnafu { path: &display })?;
    writer.close().context(ParquetSnafu { path: &display })?;
    Ok(())
}

/// Read the Parquet file at `path` into a single `RecordBatch`.
///
/// A file with zero rows decodes to an empty batch that still carries the
/// written schema.
pub fn read(path: &Path) -> CodecResult<RecordBatch> {
    let display = path.display().to_string();
    let file = File::open(path).context(IoSnafu { path: &display })?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context(ParquetSnafu { path: &display })?;
    let schema = builder.schema().clone();
    let reader = builder.build().context(ParquetSnafu { path: &display })?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.context(ArrowSnafu { path: &display })?);
    }
    concat_batches(&schema, &batches).context(ArrowSnafu { path: &display })
}
