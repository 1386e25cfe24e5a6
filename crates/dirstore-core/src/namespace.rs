//! A directory treated as a flat key → typed-value store.
//!
//! This module owns the design core of the crate: the mapping from a typed
//! in-memory [`Value`] to a self-describing leaf filename plus file
//! contents, and the lookup/decode path that reverses it.
//!
//! Encode rules, by data-kind:
//!
//! - `array`: a single-column table whose column label is the
//!   JSON-encoded shape (for example `[2,3]`) and whose rows are the
//!   elements flattened in row-major order. This is how homogeneous
//!   n-dimensional arrays round-trip through a columnar container.
//! - `series`: a single-column table whose column is literally named
//!   `data`; the in-memory label is coerced to that name on write.
//! - `frame`: the `RecordBatch` unchanged. Column labels are strings by
//!   Arrow construction, which satisfies the uniform label schema.
//! - `object`: the blob codec output unchanged.
//!
//! Writes enforce one leaf file per logical key: any prior leaf for the key,
//! under any kind combination, is removed first. The payload is written to a
//! sibling temp file and renamed into place, so readers never observe a
//! partially written leaf.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ndarray::{ArrayD, IxDyn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;

use crate::codec::{self, CodecResult, EncodingSnafu};
use crate::error::{
    CodecSnafu, IoSnafu, KeyNotFoundSnafu, StoreResult, UnknownDataKindSnafu,
    UnknownStorageKindSnafu,
};
use crate::layout::{self, TempFileGuard, TMP_SUFFIX};
use crate::tree::NamespaceTree;
use crate::value::series::SERIES_COLUMN;
use crate::value::{classify, DataKind, Series, StorageKind, Tensor, Value};

/// A directory holding typed leaf files plus nested sub-namespaces.
///
/// The struct is a stateless view: it remembers only the root path, and
/// every operation re-reads directory state, so external writers are picked
/// up on the next call.
#[derive(Debug, Clone)]
pub struct Namespace {
    root: PathBuf,
    name: String,
}

impl Namespace {
    /// Open the namespace rooted at `root`, creating the directory
    /// (recursively) if it does not yet exist. Idempotent.
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).context(IoSnafu {
            path: root.display().to_string(),
        })?;
        Ok(Self::from_existing(root))
    }

    pub(crate) fn from_existing(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Namespace { root, name }
    }

    /// The directory backing this namespace.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The namespace name: the last component of the root path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tree of sub-namespaces rooted at this namespace's directory.
    pub fn children(&self) -> NamespaceTree {
        NamespaceTree::from_existing(self.root.clone())
    }

    /// The set of logical keys currently stored, sorted.
    ///
    /// Only files carrying the leaf marker count; subdirectories and foreign
    /// files are excluded. A marker file with unrecognized kind suffixes is
    /// still reported under its key (strict reads of it fail instead).
    pub fn keys(&self) -> StoreResult<BTreeSet<String>> {
        Ok(layout::leaf_files(&self.root)?.into_keys().collect())
    }

    /// Whether a leaf record exists for `key`.
    pub fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(layout::leaf_files(&self.root)?.contains_key(key))
    }

    fn leaf_path(&self, key: &str) -> StoreResult<PathBuf> {
        layout::leaf_files(&self.root)?
            .remove(key)
            .ok_or_else(|| {
                KeyNotFoundSnafu {
                    namespace: &self.name,
                    key,
                }
                .build()
            })
    }

    /// Strict read: decode the unique leaf record for `key`.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when no leaf exists; `UnknownDataKind` /
    /// `UnknownStorageKind` when the filename suffixes do not match a
    /// recognized encoding; `Codec` when the underlying codec fails.
    pub fn read(&self, key: &str) -> StoreResult<Value> {
        let path = self.leaf_path(key)?;
        let display = path.display().to_string();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some(leaf) = layout::parse_leaf_name(name) else {
            return UnknownDataKindSnafu {
                path: display,
                kind: name,
            }
            .fail();
        };

        // The data-kind segment is judged before the storage segment, so a
        // fully foreign suffix pair reports the inner segment.
        let data_kind = DataKind::parse(leaf.data_kind).ok_or_else(|| {
            UnknownDataKindSnafu {
                path: &display,
                kind: leaf.data_kind,
            }
            .build()
        })?;
        let storage_kind = StorageKind::from_extension(leaf.storage_ext).ok_or_else(|| {
            UnknownStorageKindSnafu {
                path: &display,
                kind: leaf.storage_ext,
            }
            .build()
        })?;

        match (storage_kind, data_kind) {
            (StorageKind::Table, DataKind::Array) => {
                let batch = codec::table::read(&path).context(CodecSnafu { path: &display })?;
                let tensor =
                    batch_to_tensor(&display, &batch).context(CodecSnafu { path: &display })?;
                Ok(Value::Array(tensor))
            }
            (StorageKind::Table, DataKind::Series) => {
                let batch = codec::table::read(&path).context(CodecSnafu { path: &display })?;
                let series =
                    batch_to_series(&display, &batch).context(CodecSnafu { path: &display })?;
                Ok(Value::Series(series))
            }
            (StorageKind::Table, DataKind::Frame) => {
                let batch = codec::table::read(&path).context(CodecSnafu { path: &display })?;
                Ok(Value::Frame(batch))
            }
            (StorageKind::Blob, DataKind::Object) => {
                let value = codec::blob::read(&path).context(CodecSnafu { path: &display })?;
                Ok(Value::Object(value))
            }
            // A kind pairing the filename grammar can express but the
            // encoding scheme never produces.
            (StorageKind::Table, DataKind::Object) | (StorageKind::Blob, _) => {
                UnknownDataKindSnafu {
                    path: display,
                    kind: leaf.data_kind,
                }
                .fail()
            }
        }
    }

    /// Permissive read: `None` on any failure (missing key, unknown kind,
    /// codec error). With `verbose`, the suppressed failure is logged.
    ///
    /// This is the sole sanctioned blanket error suppression in the crate,
    /// for "key may or may not exist" access patterns.
    pub fn get(&self, key: &str, verbose: bool) -> Option<Value> {
        match self.read(key) {
            Ok(value) => Some(value),
            Err(err) => {
                if verbose {
                    log::warn!(
                        "namespace {:?}: suppressed failure reading {key:?}: {err}",
                        self.name
                    );
                }
                None
            }
        }
    }

    /// Permissive read with a caller-supplied default.
    pub fn get_or(&self, key: &str, default: impl Into<Value>, verbose: bool) -> Value {
        self.get(key, verbose).unwrap_or_else(|| default.into())
    }

    /// Strict typed read of an `object` leaf.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> StoreResult<T> {
        let path = self.leaf_path(key)?;
        let display = path.display().to_string();
        match self.read(key)? {
            Value::Object(v) => serde_json::from_value(v)
                .context(codec::JsonSnafu { path: &display })
                .context(CodecSnafu { path: &display }),
            other => EncodingSnafu {
                path: &display,
                expected: "object",
                detail: format!("stored as {}", classify(&other)),
            }
            .fail()
            .context(CodecSnafu { path: &display }),
        }
    }

    /// Store `value` under `key`, replacing any existing leaf for the key
    /// across all kind combinations.
    ///
    /// The value is classified into its data-kind, encoded through the
    /// matching codec into a temp file, and renamed into place.
    pub fn insert(&self, key: &str, value: impl Into<Value>) -> StoreResult<()> {
        let value = value.into();
        layout::validate_key(key)?;
        let kind = classify(&value);
        let file_name = layout::leaf_file_name(key, kind);
        let final_path = self.root.join(&file_name);

        // One file per key: drop leaves stored under any other kind, so no
        // stale duplicate with a differing suffix can shadow this write.
        for stale in layout::leaf_paths_for_key(&self.root, key)? {
            if stale != final_path {
                fs::remove_file(&stale).context(IoSnafu {
                    path: stale.display().to_string(),
                })?;
            }
        }

        let mut guard = TempFileGuard::new(self.root.join(format!("{file_name}.{TMP_SUFFIX}")));
        self.encode(guard.path(), &final_path, &value)?;
        fs::rename(guard.path(), &final_path).context(IoSnafu {
            path: final_path.display().to_string(),
        })?;
        guard.disarm();

        log::debug!("namespace {:?}: wrote {key:?} as {kind}", self.name);
        Ok(())
    }

    /// Store any serializable value under `key` as an `object` leaf.
    pub fn put_object<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let display = self.root.join(key).display().to_string();
        let value = serde_json::to_value(value)
            .context(codec::JsonSnafu { path: &display })
            .context(CodecSnafu { path: &display })?;
        self.insert(key, Value::Object(value))
    }

    fn encode(&self, tmp: &Path, final_path: &Path, value: &Value) -> StoreResult<()> {
        let display = final_path.display().to_string();
        match value {
            Value::Array(tensor) => {
                let batch =
                    tensor_to_batch(&display, tensor).context(CodecSnafu { path: &display })?;
                codec::table::write(tmp, &batch).context(CodecSnafu { path: &display })
            }
            Value::Series(series) => {
                let batch =
                    series_to_batch(&display, series).context(CodecSnafu { path: &display })?;
                codec::table::write(tmp, &batch).context(CodecSnafu { path: &display })
            }
            Value::Frame(batch) => {
                codec::table::write(tmp, batch).context(CodecSnafu { path: &display })
            }
            Value::Object(object) => {
                codec::blob::write(tmp, object).context(CodecSnafu { path: &display })
            }
        }
    }

    /// Remove the leaf record for `key`.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when no leaf exists for the key.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.leaf_path(key)?;
        fs::remove_file(&path).context(IoSnafu {
            path: path.display().to_string(),
        })?;
        log::debug!("namespace {:?}: deleted {key:?}", self.name);
        Ok(())
    }

    /// Delete every key currently enumerable. Not atomic: a concurrent
    /// external writer can race the scan.
    pub fn clear(&self) -> StoreResult<()> {
        for key in self.keys()? {
            self.delete(&key)?;
        }
        Ok(())
    }

    /// Lazy sequence of `(key, value)` pairs: keys are snapshotted when the
    /// iterator is created, each value is decoded on `next()`. Restartable
    /// by calling again (a fresh scan).
    pub fn items(
        &self,
    ) -> StoreResult<impl Iterator<Item = StoreResult<(String, Value)>> + '_> {
        let keys = self.keys()?;
        Ok(keys.into_iter().map(move |key| {
            let value = self.read(&key)?;
            Ok((key, value))
        }))
    }

    /// Lazy sequence of decoded values, in key order.
    pub fn values(&self) -> StoreResult<impl Iterator<Item = StoreResult<Value>> + '_> {
        Ok(self.items()?.map(|item| item.map(|(_, value)| value)))
    }
}

/// Encode a tensor as a single-column batch labeled with its JSON shape.
fn tensor_to_batch(path: &str, tensor: &Tensor) -> CodecResult<RecordBatch> {
    let shape_label =
        serde_json::to_string(tensor.shape()).context(codec::JsonSnafu { path })?;
    let (data_type, column): (DataType, ArrayRef) = match tensor {
        Tensor::Float64(a) => (
            DataType::Float64,
            Arc::new(Float64Array::from_iter_values(a.iter().copied())),
        ),
        Tensor::Int64(a) => (
            DataType::Int64,
            Arc::new(Int64Array::from_iter_values(a.iter().copied())),
        ),
    };
    let schema = Arc::new(Schema::new(vec![Field::new(shape_label, data_type, false)]));
    RecordBatch::try_new(schema, vec![column]).context(codec::ArrowSnafu { path })
}

/// Decode a single-column batch back into a tensor, reshaping the flattened
/// rows to the shape declared by the column label.
fn batch_to_tensor(path: &str, batch: &RecordBatch) -> CodecResult<Tensor> {
    let column = single_column(path, "array", batch)?;
    let schema = batch.schema();
    let field = schema.field(0);

    let shape: Vec<usize> = serde_json::from_str(field.name()).map_err(|err| {
        EncodingSnafu {
            path,
            expected: "array",
            detail: format!("column label {:?} is not a JSON shape: {err}", field.name()),
        }
        .build()
    })?;

    if column.null_count() > 0 {
        return EncodingSnafu {
            path,
            expected: "array",
            detail: format!("{} null elements", column.null_count()),
        }
        .fail();
    }

    match field.data_type() {
        DataType::Float64 => {
            let values = downcast::<Float64Array>(path, "array", &column)?
                .values()
                .to_vec();
            reshape(path, &shape, values).map(Tensor::Float64)
        }
        DataType::Int64 => {
            let values = downcast::<Int64Array>(path, "array", &column)?
                .values()
                .to_vec();
            reshape(path, &shape, values).map(Tensor::Int64)
        }
        other => EncodingSnafu {
            path,
            expected: "array",
            detail: format!("unsupported element type {other}"),
        }
        .fail(),
    }
}

/// Encode a series as a single-column batch with the canonical `data` label.
fn series_to_batch(path: &str, series: &Series) -> CodecResult<RecordBatch> {
    let values = series.values().clone();
    let field = Field::new(
        SERIES_COLUMN,
        values.data_type().clone(),
        values.null_count() > 0,
    );
    let schema = Arc::new(Schema::new(vec![field]));
    RecordBatch::try_new(schema, vec![values]).context(codec::ArrowSnafu { path })
}

/// Decode a single-column batch whose column must be literally named `data`.
fn batch_to_series(path: &str, batch: &RecordBatch) -> CodecResult<Series> {
    let column = single_column(path, "series", batch)?;
    let schema = batch.schema();
    let name = schema.field(0).name();
    if name != SERIES_COLUMN {
        return EncodingSnafu {
            path,
            expected: "series",
            detail: format!("column is named {name:?}, expected {SERIES_COLUMN:?}"),
        }
        .fail();
    }
    Ok(Series::new(SERIES_COLUMN, column))
}

fn single_column(path: &str, expected: &'static str, batch: &RecordBatch) -> CodecResult<ArrayRef> {
    if batch.num_columns() != 1 {
        return EncodingSnafu {
            path,
            expected,
            detail: format!("expected exactly 1 column, found {}", batch.num_columns()),
        }
        .fail();
    }
    Ok(batch.column(0).clone())
}

fn downcast<'a, A: Array + 'static>(
    path: &str,
    expected: &'static str,
    column: &'a ArrayRef,
) -> CodecResult<&'a A> {
    column.as_any().downcast_ref::<A>().ok_or_else(|| {
        EncodingSnafu {
            path,
            expected,
            detail: "column data does not match its declared type".to_string(),
        }
        .build()
    })
}

fn reshape<T>(path: &str, shape: &[usize], values: Vec<T>) -> CodecResult<ArrayD<T>> {
    let len = values.len();
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|err| {
        EncodingSnafu {
            path,
            expected: "array",
            detail: format!("{len} elements do not fit shape {shape:?}: {err}"),
        }
        .build()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use arrow::array::StringArray;

    fn tensor_2x3() -> Tensor {
        Tensor::Float64(
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
        )
    }

    #[test]
    fn tensor_batch_carries_shape_in_the_label() {
        let batch = tensor_to_batch("t", &tensor_2x3()).unwrap();
        assert_eq!(batch.num_columns(), 1);
        assert_eq!(batch.num_rows(), 6);
        assert_eq!(batch.schema().field(0).name(), "[2,3]");
    }

    #[test]
    fn tensor_conversion_round_trips() {
        let tensor = tensor_2x3();
        let batch = tensor_to_batch("t", &tensor).unwrap();
        assert_eq!(batch_to_tensor("t", &batch).unwrap(), tensor);
    }

    #[test]
    fn int_tensors_keep_their_dtype_class() {
        let tensor =
            Tensor::Int64(ArrayD::from_shape_vec(IxDyn(&[4]), vec![1, 2, 3, 4]).unwrap());
        let batch = tensor_to_batch("t", &tensor).unwrap();
        let loaded = batch_to_tensor("t", &batch).unwrap();
        assert!(matches!(loaded, Tensor::Int64(_)));
        assert_eq!(loaded, tensor);
    }

    #[test]
    fn rank_zero_tensor_converts() {
        let tensor = Tensor::Float64(ArrayD::from_shape_vec(IxDyn(&[]), vec![3.5]).unwrap());
        let batch = tensor_to_batch("t", &tensor).unwrap();
        assert_eq!(batch.schema().field(0).name(), "[]");
        assert_eq!(batch_to_tensor("t", &batch).unwrap(), tensor);
    }

    #[test]
    fn bad_shape_label_is_an_encoding_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "not-a-shape",
            DataType::Float64,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![1.0])) as ArrayRef],
        )
        .unwrap();
        let err = batch_to_tensor("t", &batch).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn shape_element_count_mismatch_is_an_encoding_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("[7]", DataType::Float64, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef],
        )
        .unwrap();
        let err = batch_to_tensor("t", &batch).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn null_elements_are_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("[2]", DataType::Float64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![Some(1.0), None])) as ArrayRef],
        )
        .unwrap();
        let err = batch_to_tensor("t", &batch).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn series_label_is_coerced_to_data() {
        let series = Series::new("temperature", Arc::new(Float64Array::from(vec![1.0, 2.0])));
        let batch = series_to_batch("s", &series).unwrap();
        assert_eq!(batch.schema().field(0).name(), SERIES_COLUMN);

        let loaded = batch_to_series("s", &batch).unwrap();
        assert_eq!(loaded.name(), SERIES_COLUMN);
        assert_eq!(loaded.values().to_data(), series.values().to_data());
    }

    #[test]
    fn series_decode_requires_the_data_label() {
        let schema = Arc::new(Schema::new(vec![Field::new("other", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["x"])) as ArrayRef],
        )
        .unwrap();
        let err = batch_to_series("s", &batch).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn multi_column_batches_are_not_tensors_or_series() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int64, false),
            Field::new("b", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1])) as ArrayRef,
                Arc::new(Int64Array::from(vec![2])) as ArrayRef,
            ],
        )
        .unwrap();
        assert!(batch_to_tensor("t", &batch).is_err());
        assert!(batch_to_series("s", &batch).is_err());
    }
}
