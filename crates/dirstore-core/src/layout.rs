//! On-disk layout: leaf filenames and directory scans.
//!
//! This module centralizes the path conventions shared by [`crate::Namespace`]
//! and [`crate::NamespaceTree`]:
//!
//! - A leaf record is a file named `<key>.<data-kind>.<storage-ext>.dc`
//!   directly inside a namespace directory. The final `dc` segment is the
//!   leaf marker that distinguishes records from foreign files; `key`
//!   contains no `.` characters.
//! - A sub-namespace is any subdirectory; no marker is needed at the
//!   directory level.
//!
//! Keeping the filename grammar in one place means the encode and decode
//! paths cannot drift apart, and higher-level modules work with parsed
//! segments instead of hand-rolled string slicing.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{InvalidKeySnafu, IoSnafu, StoreResult};
use crate::value::DataKind;

/// Final filename segment marking a file as a leaf record.
pub const LEAF_MARKER: &str = "dc";

/// Suffix appended after the marker while a leaf is being written; such
/// files never parse as leaves and are renamed into place on success.
pub(crate) const TMP_SUFFIX: &str = "tmp";

/// The parsed segments of a leaf record filename.
///
/// `data_kind` and `storage_ext` are raw segments; mapping them onto the
/// known kinds (and rejecting foreign values) is the caller's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafName<'a> {
    /// Logical key: the filename with all suffixes stripped.
    pub key: &'a str,
    /// Raw data-kind segment; empty when the name has too few segments.
    pub data_kind: &'a str,
    /// Raw storage-extension segment; empty when the name has too few
    /// segments.
    pub storage_ext: &'a str,
}

/// Assemble the filename for a leaf record.
pub fn leaf_file_name(key: &str, kind: DataKind) -> String {
    format!(
        "{key}.{kind}.{ext}.{LEAF_MARKER}",
        kind = kind.as_str(),
        ext = kind.storage_kind().extension()
    )
}

/// Parse a filename into leaf segments, or `None` when the file does not
/// carry the leaf marker.
///
/// A malformed marker file (wrong number of segments, as left behind by a
/// foreign writer) still yields its key — the portion before the first `.` —
/// with empty kind segments, so enumeration reports it and a strict read
/// rejects it with an unknown-kind error.
pub fn parse_leaf_name(name: &str) -> Option<LeafName<'_>> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 || *parts.last().unwrap() != LEAF_MARKER {
        return None;
    }
    let key = parts[0];
    if key.is_empty() {
        return None;
    }
    let (data_kind, storage_ext) = if parts.len() >= 4 {
        (parts[1], parts[parts.len() - 2])
    } else {
        ("", "")
    };
    Some(LeafName {
        key,
        data_kind,
        storage_ext,
    })
}

/// The logical key of a leaf record filename, if it is one.
pub fn leaf_key(name: &str) -> Option<&str> {
    parse_leaf_name(name).map(|leaf| leaf.key)
}

/// Scan `root` and map each logical key to its leaf file path.
///
/// Subdirectories and files without the leaf marker are skipped. The write
/// path keeps keys unique on disk; if a foreign writer left duplicates, the
/// lexically last file wins.
pub fn leaf_files(root: &Path) -> StoreResult<BTreeMap<String, PathBuf>> {
    let mut map = BTreeMap::new();
    for (name, path) in scan_files(root)? {
        if let Some(key) = leaf_key(&name) {
            map.insert(key.to_string(), path);
        }
    }
    Ok(map)
}

/// Every leaf file whose logical key equals `key`, across all kind
/// combinations. Used by the write path to enforce one-file-per-key.
pub(crate) fn leaf_paths_for_key(root: &Path, key: &str) -> StoreResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (name, path) in scan_files(root)? {
        if leaf_key(&name) == Some(key) {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Scan `root` and map each immediate subdirectory name to its path.
pub fn subdirectories(root: &Path) -> StoreResult<BTreeMap<String, PathBuf>> {
    let display = root.display().to_string();
    let mut map = BTreeMap::new();
    for entry in fs::read_dir(root).context(IoSnafu { path: &display })? {
        let entry = entry.context(IoSnafu { path: &display })?;
        let file_type = entry.file_type().context(IoSnafu { path: &display })?;
        if !file_type.is_dir() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            map.insert(name, entry.path());
        }
    }
    Ok(map)
}

fn scan_files(root: &Path) -> StoreResult<Vec<(String, PathBuf)>> {
    let display = root.display().to_string();
    let mut files = Vec::new();
    for entry in fs::read_dir(root).context(IoSnafu { path: &display })? {
        let entry = entry.context(IoSnafu { path: &display })?;
        let file_type = entry.file_type().context(IoSnafu { path: &display })?;
        if !file_type.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            files.push((name, entry.path()));
        }
    }
    Ok(files)
}

/// Validate a logical key before it reaches the filesystem.
///
/// Keys must be non-empty and free of `.` (the suffix separator) and path
/// separators.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return InvalidKeySnafu {
            key,
            detail: "keys must be non-empty",
        }
        .fail();
    }
    if key.contains('.') {
        return InvalidKeySnafu {
            key,
            detail: "keys must not contain '.'",
        }
        .fail();
    }
    if key.contains('/') || key.contains('\\') {
        return InvalidKeySnafu {
            key,
            detail: "keys must not contain path separators",
        }
        .fail();
    }
    Ok(())
}

/// Validate a namespace name before it reaches the filesystem. Dots are
/// allowed here (only leaf keys encode suffixes), path traversal is not.
pub(crate) fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return InvalidKeySnafu {
            key: name,
            detail: "namespace names must be non-empty and not '.' or '..'",
        }
        .fail();
    }
    if name.contains('/') || name.contains('\\') {
        return InvalidKeySnafu {
            key: name,
            detail: "namespace names must not contain path separators",
        }
        .fail();
    }
    Ok(())
}

/// Guard that removes a temporary file on drop unless disarmed.
/// Ensures cleanup on error paths during write-then-rename.
pub(crate) struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Disarm the guard so the file is NOT removed on drop.
    /// Call this after a successful rename.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            // Best-effort cleanup; we are likely already handling another error.
            let _ = fs::remove_file(&self.path);
        }
    }
}
