use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use docqa_domain::{CollectionId, Error, Result};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::info;

use crate::manifest::{IndexManifest, MANIFEST_FILE};
use crate::store::VectorIndex;

#[derive(Debug, Default)]
struct CollectionLocks {
    /// Held for a whole ingestion
    ingest: Mutex<()>,
    /// Writers persist or delete the index, readers load it
    index: RwLock<()>,
}

/// Owns the storage root and hands out collections.
///
/// Every collection gets one directory under the root and one set of locks
/// shared by all handles to it. Collections never share locks.
#[derive(Debug)]
pub struct CollectionStore {
    root: PathBuf,
    locks: DashMap<CollectionId, Arc<CollectionLocks>>,
}

impl CollectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: DashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquires the handle through which all reads and writes of a
    /// collection's storage go. The directory is created on first save.
    pub fn collection(&self, id: &CollectionId) -> Collection {
        let locks = Arc::clone(&self.locks.entry(id.clone()).or_default());
        Collection { id: id.clone(), dir: self.root.join(id.as_str()), locks }
    }

    /// Collections that currently hold an index, sorted by id.
    pub async fn list(&self) -> Result<Vec<CollectionId>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage(&self.root, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(&self.root, e))?
        {
            let Ok(id) = CollectionId::new(entry.file_name().to_string_lossy()) else {
                continue;
            };
            if tokio::fs::try_exists(entry.path().join(MANIFEST_FILE))
                .await
                .unwrap_or(false)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Drops the handle and forgets the collection's locks once no other
    /// handle holds them.
    pub fn release(&self, collection: Collection) {
        let Collection { id, locks, .. } = collection;
        drop(locks);
        self.locks.remove_if(&id, |_, locks| Arc::strong_count(locks) == 1);
    }

    /// Removes a collection and its index. Waits for any ingestion into it to
    /// finish first.
    pub async fn delete(&self, id: &CollectionId) -> Result<()> {
        let collection = self.collection(id);
        let result = remove_collection(&collection).await;
        self.release(collection);
        result?;
        info!(collection = %id, "Deleted collection");
        Ok(())
    }
}

async fn remove_collection(collection: &Collection) -> Result<()> {
    let _ingest = collection.lock_ingest().await;
    let _index = collection.locks.index.write().await;

    if VectorIndex::read_manifest(&collection.dir).await?.is_none() {
        return Err(Error::IndexNotFound(collection.id.to_string()));
    }
    tokio::fs::remove_dir_all(&collection.dir)
        .await
        .map_err(|e| Error::storage(&collection.dir, e))
}

/// Handle to one collection's storage directory and locks.
#[derive(Debug, Clone)]
pub struct Collection {
    id: CollectionId,
    dir: PathBuf,
    locks: Arc<CollectionLocks>,
}

impl Collection {
    pub fn id(&self) -> &CollectionId {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serializes ingestions into this collection.
    pub async fn lock_ingest(&self) -> MutexGuard<'_, ()> {
        self.locks.ingest.lock().await
    }

    pub async fn manifest(&self) -> Result<Option<IndexManifest>> {
        let _guard = self.locks.index.read().await;
        VectorIndex::read_manifest(&self.dir).await
    }

    /// Loads the index. Concurrent loads proceed together; a save in
    /// progress is waited for.
    pub async fn load_index(&self) -> Result<VectorIndex> {
        let _guard = self.locks.index.read().await;
        VectorIndex::load(&self.dir).await.map_err(|e| match e {
            Error::IndexNotFound(_) => Error::IndexNotFound(self.id.to_string()),
            e => e,
        })
    }

    pub async fn save_index(&self, index: &VectorIndex) -> Result<IndexManifest> {
        let _guard = self.locks.index.write().await;
        index.save(&self.dir).await
    }
}
