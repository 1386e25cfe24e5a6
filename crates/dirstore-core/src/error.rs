//! Error taxonomy for namespace and namespace-tree operations.
//!
//! Strict operations (`read`, `delete`, `open`, ...) propagate every variant
//! to the caller. The permissive `get` family on [`crate::Namespace`] is the
//! sole place where these errors are blanket-suppressed in exchange for a
//! caller-supplied default.

use snafu::{Backtrace, Snafu};

use crate::codec::CodecError;

/// General result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by namespace and namespace-tree operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// Lookup or delete addressed a logical key (or namespace name) with no
    /// backing file or subdirectory.
    #[snafu(display("key {key:?} not found in namespace {namespace:?}"))]
    KeyNotFound {
        /// Name of the namespace that was searched.
        namespace: String,
        /// The logical key or namespace name that was requested.
        key: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A leaf file carries a data-kind segment that is not one of
    /// `array`, `series`, `frame`, `object` — or a data-kind that is not
    /// valid under the file's storage-kind.
    #[snafu(display("unknown data kind {kind:?} in leaf file {path}"))]
    UnknownDataKind {
        /// Path of the offending leaf file.
        path: String,
        /// The unrecognized data-kind segment.
        kind: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A leaf file carries a storage extension that maps to no known codec
    /// family.
    #[snafu(display("unknown storage kind {kind:?} in leaf file {path}"))]
    UnknownStorageKind {
        /// Path of the offending leaf file.
        path: String,
        /// The unrecognized storage extension segment.
        kind: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The underlying table or blob codec failed during encode or decode.
    #[snafu(display("codec failure for leaf file {path}: {source}"))]
    Codec {
        /// Path of the leaf file being encoded or decoded.
        path: String,
        /// The underlying codec error.
        source: CodecError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Delete was requested on a namespace directory that still contains
    /// entries. Contents must be cleared first.
    #[snafu(display("namespace directory not empty: {path}"))]
    DirectoryNotEmpty {
        /// Path of the non-empty directory.
        path: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A logical key or namespace name failed validation before any
    /// filesystem access.
    #[snafu(display("invalid key {key:?}: {detail}"))]
    InvalidKey {
        /// The rejected key or name.
        key: String,
        /// Why the key was rejected.
        detail: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// A filesystem operation failed.
    #[snafu(display("I/O error at {path}: {source}"))]
    Io {
        /// Path where the I/O error occurred.
        path: String,
        /// Underlying I/O error with platform-specific details.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}
