//! Serialization collaborators: the table codec and the blob codec.
//!
//! The store treats both codecs as opaque byte producers with a narrow
//! contract:
//!
//! - [`table`]: durable columnar read/write of a `RecordBatch` (Parquet).
//!   Must preserve column order, column labels, and numeric precision.
//! - [`blob`]: lossless read/write of an arbitrary dynamic value
//!   (`serde_json::Value`).
//!
//! The data-kind specific reshaping (array shapes, the series column
//! contract) sits above these codecs, in the namespace module.

use snafu::{Backtrace, Snafu};

pub mod blob;
pub mod table;

/// General result type used by codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised by the table and blob codecs, or by the structural
/// encode/decode rules layered on top of their raw output.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CodecError {
    /// The Parquet layer failed during read or write.
    #[snafu(display("parquet error at {path}: {source}"))]
    Parquet {
        /// Path of the file being read or written.
        path: String,
        /// Underlying Parquet error.
        source: parquet::errors::ParquetError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// An Arrow operation failed while assembling or concatenating batches.
    #[snafu(display("arrow error at {path}: {source}"))]
    Arrow {
        /// Path of the file being read or written.
        path: String,
        /// Underlying Arrow error.
        source: arrow::error::ArrowError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// JSON serialization or deserialization failed.
    #[snafu(display("json error at {path}: {source}"))]
    Json {
        /// Path of the file being read or written.
        path: String,
        /// Underlying serde_json error.
        source: serde_json::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A filesystem operation failed inside a codec.
    #[snafu(display("I/O error at {path}: {source}"))]
    Io {
        /// Path where the I/O error occurred.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The raw codec output does not satisfy the structural contract of the
    /// data-kind being decoded (wrong column count, wrong column label,
    /// nulls in an array column, undecodable shape label, element count
    /// not matching the declared shape).
    #[snafu(display("invalid {expected} encoding at {path}: {detail}"))]
    Encoding {
        /// Path of the offending file.
        path: String,
        /// The data-kind whose contract was violated.
        expected: &'static str,
        /// What exactly did not match.
        detail: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}
