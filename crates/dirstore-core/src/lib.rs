//! Filesystem-backed key-value storage for heterogeneous typed values.
//!
//! A **namespace** is a directory treated as a flat key → value store. Each
//! stored value is a single **leaf record**: a file whose name encodes the
//! logical key, the logical shape of the value (its *data-kind*) and the
//! codec family that produced the bytes (its *storage-kind*):
//!
//! ```text
//! <key>.<data-kind>.<storage-ext>.dc
//! ```
//!
//! Four data-kinds are supported:
//!
//! - `array`: a homogeneous n-dimensional numeric array, stored as a
//!   single-column Parquet table whose column label is the JSON-encoded
//!   shape and whose rows are the flattened elements.
//! - `series`: a labeled one-dimensional sequence, stored as a
//!   single-column Parquet table with the literal column label `data`.
//! - `frame`: a labeled tabular structure (`RecordBatch`), stored as a
//!   Parquet table unchanged.
//! - `object`: any other value, serialized through the generic blob codec
//!   (JSON).
//!
//! Every other subdirectory of a namespace directory is itself a namespace,
//! reachable through [`NamespaceTree`]. Both [`Namespace`] and
//! [`NamespaceTree`] are stateless views: each call re-reads directory state,
//! so the directory listing is the single source of truth and there is no
//! cache to invalidate.
//!
//! ```no_run
//! use dirstore_core::Namespace;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ns = Namespace::create("/data/experiments")?;
//! ns.insert("config", json!({"seed": 7, "trials": 100}))?;
//!
//! let run = ns.children().get_or_create("run-001")?;
//! assert_eq!(run.keys()?.len(), 0);
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]

pub mod codec;
pub mod error;
pub mod layout;
pub mod namespace;
pub mod tree;
pub mod value;

pub use codec::CodecError;
pub use error::{StoreError, StoreResult};
pub use namespace::Namespace;
pub use tree::NamespaceTree;
pub use value::{classify, DataKind, Series, StorageKind, Tensor, Value};
