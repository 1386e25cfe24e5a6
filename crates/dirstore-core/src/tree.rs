//! The tree of sub-namespaces under a directory.
//!
//! Every immediate subdirectory of the root is a namespace; the tree wraps
//! them lazily on access and caches nothing, so external directory creation
//! and deletion are visible on the next call. Mutual recursion with
//! [`Namespace`] is purely structural: a namespace exposes a tree over its
//! own directory, and each tree entry is again a namespace.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::error::{DirectoryNotEmptySnafu, IoSnafu, KeyNotFoundSnafu, StoreResult};
use crate::layout;
use crate::namespace::Namespace;

/// A directory whose immediate subdirectories are namespaces.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    root: PathBuf,
    name: String,
}

impl NamespaceTree {
    /// Open the tree rooted at `root`, creating the directory (recursively)
    /// if it does not yet exist. Idempotent.
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
        NamespaceTree { root, name }
    }

    /// The directory backing this tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The tree name: the last component of the root path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the immediate sub-namespaces, sorted.
    pub fn keys(&self) -> StoreResult<BTreeSet<String>> {
        Ok(layout::subdirectories(&self.root)?.into_keys().collect())
    }

    /// Whether a sub-namespace named `name` exists.
    pub fn contains(&self, name: &str) -> StoreResult<bool> {
        Ok(layout::subdirectories(&self.root)?.contains_key(name))
    }

    /// Strict lookup: wrap the existing subdirectory `name` as a namespace.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when no such subdirectory exists.
    pub fn open(&self, name: &str) -> StoreResult<Namespace> {
        let path = layout::subdirectories(&self.root)?
            .remove(name)
            .ok_or_else(|| {
                KeyNotFoundSnafu {
                    namespace: &self.name,
                    key: name,
                }
                .build()
            })?;
        Ok(Namespace::from_existing(path))
    }

    /// Get-or-create: return the namespace named `name`, creating its
    /// directory first if absent. Never fails under normal filesystem
    /// permissions.
    pub fn get_or_create(&self, name: &str) -> StoreResult<Namespace> {
        layout::validate_name(name)?;
        Namespace::create(self.root.join(name))
    }

    /// Remove the sub-namespace named `name`.
    ///
    /// Mirrors empty-directory-removal semantics: the namespace must hold no
    /// leaves and no sub-namespaces of its own.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` when absent; `DirectoryNotEmpty` when the directory
    /// still contains entries.
    pub fn delete(&self, name: &str) -> StoreResult<()> {
        let path = layout::subdirectories(&self.root)?
            .remove(name)
            .ok_or_else(|| {
                KeyNotFoundSnafu {
                    namespace: &self.name,
                    key: name,
                }
                .build()
            })?;
        match fs::remove_dir(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::DirectoryNotEmpty => {
                DirectoryNotEmptySnafu {
                    path: path.display().to_string(),
                }
                .fail()
            }
            Err(err) => Err(err).context(IoSnafu {
                path: path.display().to_string(),
            }),
        }
    }

    /// Delete every currently enumerable sub-namespace. Propagates the first
    /// failure; like namespace clearing, this is not atomic.
    pub fn clear(&self) -> StoreResult<()> {
        for name in self.keys()? {
            self.delete(&name)?;
        }
        Ok(())
    }

    /// Lazy sequence of `(name, namespace)` pairs; names are snapshotted
    /// when the iterator is created. Restartable by calling again.
    pub fn items(
        &self,
    ) -> StoreResult<impl Iterator<Item = (String, Namespace)> + '_> {
        let dirs = layout::subdirectories(&self.root)?;
        Ok(dirs
            .into_iter()
            .map(|(name, path)| (name, Namespace::from_existing(path))))
    }

    /// Lazy sequence of namespaces, in name order.
    pub fn values(&self) -> StoreResult<impl Iterator<Item = Namespace> + '_> {
        Ok(self.items()?.map(|(_, ns)| ns))
    }
}
