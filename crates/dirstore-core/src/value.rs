//! Storable values and their kind classification.
//!
//! [`Value`] is the tagged union of everything a namespace can hold. The two
//! kind enums mirror the leaf filename segments:
//!
//! - [`DataKind`]: the logical shape of the value (`array`, `series`,
//!   `frame`, `object`), written as the innermost suffix.
//! - [`StorageKind`]: the codec family that produced the file contents
//!   (`table` → Parquet, `blob` → JSON), written as the outer suffix via its
//!   file extension.
//!
//! [`classify`] implements the write-side dispatch as an ordered chain of
//! capability checks; the first matching kind wins.

use std::fmt;

use arrow::record_batch::RecordBatch;
use ndarray::ArrayD;

pub mod series;
pub mod tensor;

pub use series::Series;
pub use tensor::Tensor;

/// The logical shape of a stored value, encoded as the innermost filename
/// suffix of a leaf record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Homogeneous n-dimensional numeric array.
    Array,
    /// Labeled one-dimensional sequence.
    Series,
    /// Labeled two-dimensional tabular structure.
    Frame,
    /// Anything else, serialized through the blob codec.
    Object,
}

impl DataKind {
    /// The filename segment for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Array => "array",
            DataKind::Series => "series",
            DataKind::Frame => "frame",
            DataKind::Object => "object",
        }
    }

    /// Parse a filename segment back into a kind.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "array" => Some(DataKind::Array),
            "series" => Some(DataKind::Series),
            "frame" => Some(DataKind::Frame),
            "object" => Some(DataKind::Object),
            _ => None,
        }
    }

    /// The codec family this data-kind is stored under.
    pub fn storage_kind(self) -> StorageKind {
        match self {
            DataKind::Array | DataKind::Series | DataKind::Frame => StorageKind::Table,
            DataKind::Object => StorageKind::Blob,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The codec family that encoded a leaf record's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Columnar table storage (Parquet).
    Table,
    /// Generic serialized-object storage (JSON).
    Blob,
}

impl StorageKind {
    /// The codec-specific file extension written between the data-kind
    /// segment and the leaf marker.
    pub fn extension(self) -> &'static str {
        match self {
            StorageKind::Table => "parquet",
            StorageKind::Blob => "json",
        }
    }

    /// Map a file extension back to a codec family.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "parquet" => Some(StorageKind::Table),
            "json" => Some(StorageKind::Blob),
            _ => None,
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A value that can be stored in a namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Homogeneous n-dimensional numeric array.
    Array(Tensor),
    /// Labeled one-dimensional sequence.
    Series(Series),
    /// Labeled tabular structure.
    Frame(RecordBatch),
    /// Arbitrary dynamic value, round-tripped through the blob codec.
    Object(serde_json::Value),
}

impl Value {
    /// Borrow the tensor if this is an `Array` value.
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Array(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow the series if this is a `Series` value.
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Series(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the record batch if this is a `Frame` value.
    pub fn as_frame(&self) -> Option<&RecordBatch> {
        match self {
            Value::Frame(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the dynamic value if this is an `Object` value.
    pub fn as_object(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }
}

/// Classify a value into the data-kind it will be stored under.
///
/// The checks run in a fixed priority order and the first match wins:
/// is it a homogeneous array, a labeled 1-D sequence, a labeled 2-D frame,
/// or anything else (object). With a tagged union the chain collapses into a
/// single match, but the ordering contract is what callers rely on when a
/// value could plausibly satisfy more than one capability.
pub fn classify(value: &Value) -> DataKind {
    match value {
        Value::Array(_) => DataKind::Array,
        Value::Series(_) => DataKind::Series,
        Value::Frame(_) => DataKind::Frame,
        Value::Object(_) => DataKind::Object,
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Array(t)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Array(Tensor::Float64(a))
    }
}

impl From<ArrayD<i64>> for Value {
    fn from(a: ArrayD<i64>) -> Self {
        Value::Array(Tensor::Int64(a))
    }
}

impl From<Series> for Value {
    fn from(s: Series) -> Self {
        Value::Series(s)
    }
}

impl From<RecordBatch> for Value {
    fn from(b: RecordBatch) -> Self {
        Value::Frame(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Object(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Object(serde_json::Value::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Object(serde_json::Value::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Object(serde_json::Value::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Object(serde_json::Value::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Object(serde_json::Value::from(v))
    }
}
