//! [`EntityStore`] reading entity documents from a directory.
//!
//! Each entity lives in `{dir}/{id}.json` in the `Special:EntityData` format,
//! so a snapshot can be captured with `curl` and replayed offline.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use thiserror::Error;
use wikirepo_core::{Entity, EntityId, EntityStore, StoreError};

use crate::parse_entity_document;

/// Errors raised while opening or writing a snapshot directory.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot directory could not be opened.
    #[error("failed to open snapshot directory '{path}': {source}")]
    Open {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
    /// A document could not be written.
    #[error("failed to write snapshot document for {id}: {source}")]
    Write {
        /// Entity being written.
        id: EntityId,
        /// Underlying IO failure.
        #[source]
        source: io::Error,
    },
}

/// Entity store backed by one JSON document per entity.
///
/// Entities without a document are [`StoreError::NotFound`] unless a
/// fallback store is attached, in which case the fallback answers.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use wikirepo_core::{EntityId, EntityStore, StoreError};
/// use wikirepo_data::SnapshotEntityStore;
///
/// let dir = tempfile::tempdir()?;
/// let path = Utf8Path::from_path(dir.path()).ok_or("non UTF-8 temp dir")?;
/// let store = SnapshotEntityStore::open(path)?;
/// store.write_document(
///     EntityId::item(64),
///     br#"{"entities":{"Q64":{"id":"Q64","labels":{"en":{"value":"Berlin"}}}}}"#,
/// )?;
///
/// assert!(store.fetch(EntityId::item(64)).is_ok());
/// assert_eq!(
///     store.fetch(EntityId::item(1)),
///     Err(StoreError::NotFound { id: EntityId::item(1) }),
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SnapshotEntityStore {
    root: Utf8PathBuf,
    dir: fs_utf8::Dir,
    fallback: Option<Box<dyn EntityStore>>,
}

impl std::fmt::Debug for SnapshotEntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEntityStore")
            .field("root", &self.root)
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

impl SnapshotEntityStore {
    /// Open the snapshot directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Open`] when the directory cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, SnapshotError> {
        let dir = fs_utf8::Dir::open_ambient_dir(path, ambient_authority()).map_err(|source| {
            SnapshotError::Open {
                path: path.to_owned(),
                source,
            }
        })?;
        Ok(Self {
            root: path.to_owned(),
            dir,
            fallback: None,
        })
    }

    /// Answer entities missing from the snapshot with `store`.
    #[must_use]
    pub fn with_fallback(mut self, store: impl EntityStore + 'static) -> Self {
        self.fallback = Some(Box::new(store));
        self
    }

    /// Directory the snapshot reads from.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Store the raw document for `id`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Write`] when the file cannot be written.
    pub fn write_document(&self, id: EntityId, document: &[u8]) -> Result<(), SnapshotError> {
        self.dir
            .write(document_name(id), document)
            .map_err(|source| SnapshotError::Write { id, source })
    }

    /// Whether a document for `id` exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.dir.is_file(document_name(id))
    }
}

impl EntityStore for SnapshotEntityStore {
    fn fetch(&self, id: EntityId) -> Result<Entity, StoreError> {
        let name = document_name(id);
        match self.dir.read(&name) {
            Ok(mut bytes) => {
                parse_entity_document(id, &mut bytes).map_err(|err| err.into_store_error(id))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.fallback.as_ref().map_or_else(
                    || Err(StoreError::NotFound { id }),
                    |store| {
                        debug!("{id} is not in the snapshot at {}; using fallback", self.root);
                        store.fetch(id)
                    },
                )
            }
            Err(err) => Err(StoreError::Transport {
                id,
                message: format!("failed to read {}: {err}", self.root.join(&name)),
            }),
        }
    }
}

fn document_name(id: EntityId) -> String {
    format!("{id}.json")
}
