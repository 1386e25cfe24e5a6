//! Labeled one-dimensional sequences.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef};

/// The fixed column label a series is stored under. Whatever label a series
/// carries in memory, the on-disk table uses this literal name, so a loaded
/// series always reports it.
pub const SERIES_COLUMN: &str = "data";

/// A labeled one-dimensional sequence of Arrow values.
///
/// Any Arrow array type is accepted; the table codec is responsible for
/// round-tripping values and element type losslessly.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    values: ArrayRef,
}

impl Series {
    /// Create a series with an explicit label.
    pub fn new(name: impl Into<String>, values: ArrayRef) -> Self {
        Series {
            name: name.into(),
            values,
        }
    }

    /// Create a series with the canonical on-disk label.
    pub fn unnamed(values: ArrayRef) -> Self {
        Series::new(SERIES_COLUMN, values)
    }

    /// The series label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying Arrow array.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        // ArrayRef has no direct equality; compare the underlying data.
        self.name == other.name && self.values.to_data() == other.values.to_data()
    }
}

impl From<Vec<f64>> for Series {
    fn from(v: Vec<f64>) -> Self {
        Series::unnamed(Arc::new(arrow::array::Float64Array::from(v)))
    }
}

impl From<Vec<i64>> for Series {
    fn from(v: Vec<i64>) -> Self {
        Series::unnamed(Arc::new(arrow::array::Int64Array::from(v)))
    }
}
