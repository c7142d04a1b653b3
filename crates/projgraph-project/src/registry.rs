//! Per-collection document registry.
//!
//! A [`PathKeyedRegistry`] tracks the documents of one collection (source or
//! additional) by file path and, for documents backed by a live editor
//! buffer, by buffer identity. Each entry moves through
//!
//! ```text
//! Unregistered -> PendingAdd -> Committed -> PendingRemove -> Unregistered
//!                     |                                           ^
//!                     +---------------- cancelled ----------------+
//! ```
//!
//! `PendingAdd` and `PendingRemove` only exist while a batch is open, or
//! after a failed flush until the project next commits. The
//! registry does no I/O: the owning project acquires watch tokens and hands
//! them in, and gets them back when an entry goes away.

use std::collections::HashMap;

use indexmap::IndexMap;

use projgraph_core::{BufferId, DocumentCollection, DocumentId, DocumentInfo, TextLoader};
use projgraph_store::{PathComparison, WatchToken};

use crate::error::ProjectError;

/// Lifecycle stage of a tracked document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Added inside an open batch; not yet in the snapshot.
    PendingAdd,
    /// Visible in the snapshot.
    Committed,
    /// Removed inside an open batch; still in the snapshot.
    PendingRemove,
}

/// One tracked document.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub info: DocumentInfo,
    pub buffer: Option<BufferId>,
    pub state: EntryState,
    watch: Option<WatchToken>,
    path_key: Option<String>,
}

impl RegistryEntry {
    /// Returns true if the entry is part of the current snapshot.
    pub fn is_visible(&self) -> bool {
        matches!(self.state, EntryState::Committed | EntryState::PendingRemove)
    }
}

/// What a removal did to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The entry was still pending and has been forgotten outright.
    Cancelled { watch: Option<WatchToken> },
    /// The entry is now `PendingRemove` and leaves the snapshot at flush.
    Deferred { watch: Option<WatchToken> },
}

/// Bookkeeping released when an entry leaves the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forgotten {
    pub id: DocumentId,
    pub watch: Option<WatchToken>,
    /// Set for buffer-bound documents that were visible in the snapshot.
    pub closed: bool,
}

/// Path- and buffer-keyed tracker for one document collection.
#[derive(Debug)]
pub struct PathKeyedRegistry {
    collection: DocumentCollection,
    comparison: PathComparison,
    by_path: HashMap<String, DocumentId>,
    by_buffer: HashMap<BufferId, DocumentId>,
    entries: IndexMap<DocumentId, RegistryEntry>,
    pending_adds: Vec<DocumentId>,
    pending_removes: Vec<DocumentId>,
}

impl PathKeyedRegistry {
    pub fn new(collection: DocumentCollection, comparison: PathComparison) -> Self {
        PathKeyedRegistry {
            collection,
            comparison,
            by_path: HashMap::new(),
            by_buffer: HashMap::new(),
            entries: IndexMap::new(),
            pending_adds: Vec::new(),
            pending_removes: Vec::new(),
        }
    }

    pub fn collection(&self) -> DocumentCollection {
        self.collection
    }

    /// Fails with `DuplicateEntry` if `path` or `buffer` is registered in
    /// any state.
    pub fn ensure_can_add(&self, path: Option<&str>, buffer: Option<BufferId>) -> Result<(), ProjectError> {
        if let Some(path) = path {
            if self.by_path.contains_key(&self.comparison.key(path)) {
                return Err(ProjectError::DuplicateEntry(format!(
                    "{} document '{path}' is already tracked",
                    self.collection
                )));
            }
        }
        if let Some(buffer) = buffer {
            if self.by_buffer.contains_key(&buffer) {
                return Err(ProjectError::DuplicateEntry(format!(
                    "{} document for {buffer} is already tracked",
                    self.collection
                )));
            }
        }
        Ok(())
    }

    /// Starts tracking a document. Callers check [`Self::ensure_can_add`]
    /// first; `state` is `PendingAdd` inside a batch and `Committed` once the
    /// immediate add has been committed.
    pub fn insert(
        &mut self,
        info: DocumentInfo,
        buffer: Option<BufferId>,
        watch: Option<WatchToken>,
        state: EntryState,
    ) {
        let id = info.id;
        let path_key = info.file_path.as_deref().map(|p| self.comparison.key(p));
        if let Some(key) = &path_key {
            self.by_path.insert(key.clone(), id);
        }
        if let Some(buffer) = buffer {
            self.by_buffer.insert(buffer, id);
        }
        if state == EntryState::PendingAdd {
            self.pending_adds.push(id);
        }
        self.entries.insert(
            id,
            RegistryEntry {
                info,
                buffer,
                state,
                watch,
                path_key,
            },
        );
    }

    /// The tracked document at `path`. Entries pending removal are no
    /// longer tracked.
    pub fn lookup_path(&self, path: &str) -> Result<DocumentId, ProjectError> {
        self.by_path
            .get(&self.comparison.key(path))
            .filter(|id| self.is_tracked(**id))
            .copied()
            .ok_or_else(|| {
                ProjectError::NotFound(format!("{} document '{path}' is not tracked", self.collection))
            })
    }

    /// The tracked document bound to `buffer`.
    pub fn lookup_buffer(&self, buffer: BufferId) -> Result<DocumentId, ProjectError> {
        self.by_buffer
            .get(&buffer)
            .filter(|id| self.is_tracked(**id))
            .copied()
            .ok_or_else(|| {
                ProjectError::NotFound(format!("{} document for {buffer} is not tracked", self.collection))
            })
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.lookup_path(path).is_ok()
    }

    pub fn contains_buffer(&self, buffer: BufferId) -> bool {
        self.lookup_buffer(buffer).is_ok()
    }

    pub fn entry(&self, id: DocumentId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    /// Tracked document identities in the order they were added.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.state != EntryState::PendingRemove)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Removes a tracked entry inside a batch. A pending add is cancelled
    /// outright; a committed entry becomes `PendingRemove`.
    pub fn remove_in_batch(&mut self, id: DocumentId) -> Option<Removal> {
        let entry = self.entries.get_mut(&id)?;
        match entry.state {
            EntryState::PendingAdd => {
                self.pending_adds.retain(|pending| *pending != id);
                let forgotten = self.forget(id)?;
                Some(Removal::Cancelled {
                    watch: forgotten.watch,
                })
            }
            EntryState::Committed => {
                entry.state = EntryState::PendingRemove;
                let watch = entry.watch.take();
                self.pending_removes.push(id);
                Some(Removal::Deferred { watch })
            }
            EntryState::PendingRemove => None,
        }
    }

    /// Drops an entry and its keys.
    pub fn forget(&mut self, id: DocumentId) -> Option<Forgotten> {
        let entry = self.entries.shift_remove(&id)?;
        if let Some(key) = &entry.path_key {
            self.by_path.remove(key);
        }
        if let Some(buffer) = entry.buffer {
            self.by_buffer.remove(&buffer);
        }
        Some(Forgotten {
            id,
            closed: entry.buffer.is_some() && entry.is_visible(),
            watch: entry.watch,
        })
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_adds.is_empty() || !self.pending_removes.is_empty()
    }

    /// Documents waiting to be added, in the order they were added.
    pub fn pending_add_documents(&self) -> Vec<DocumentInfo> {
        self.pending_adds
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|e| e.info.clone())
            .collect()
    }

    pub fn pending_remove_ids(&self) -> Vec<DocumentId> {
        self.pending_removes.clone()
    }

    pub fn pending_counts(&self) -> (usize, usize) {
        (self.pending_adds.len(), self.pending_removes.len())
    }

    /// Settles the registry after a successful flush: pending adds become
    /// committed, pending removes are forgotten. Returns the entries that
    /// left, so the caller can send closed notifications.
    pub fn complete_flush(&mut self) -> Vec<Forgotten> {
        let adds = std::mem::take(&mut self.pending_adds);
        for id in adds {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.state = EntryState::Committed;
            }
        }
        let removes = std::mem::take(&mut self.pending_removes);
        let forgotten = removes.into_iter().filter_map(|id| self.forget(id)).collect();

        // Batches are only large during bulk load; don't keep the capacity.
        self.pending_adds = Vec::new();
        self.pending_removes = Vec::new();
        self.by_path.shrink_to_fit();
        self.by_buffer.shrink_to_fit();
        forgotten
    }

    /// The committed, file-backed document at `path` with the loader a
    /// reload should install. `None` when the path is unknown, still
    /// pending, or bound to a buffer.
    pub fn reload_candidate(&self, path: &str) -> Option<(DocumentId, TextLoader)> {
        let id = self.by_path.get(&self.comparison.key(path))?;
        let entry = self.entries.get(id)?;
        if entry.state != EntryState::Committed || entry.buffer.is_some() {
            return None;
        }
        Some((*id, entry.info.loader.reloaded()))
    }

    /// Returns true if `path` is registered in any state.
    pub fn knows_path(&self, path: &str) -> bool {
        self.by_path.contains_key(&self.comparison.key(path))
    }

    pub fn set_loader(&mut self, id: DocumentId, loader: TextLoader) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.info.loader = loader;
        }
    }

    /// Forgets every entry, returning what each one held.
    pub fn drain_all(&mut self) -> Vec<Forgotten> {
        let ids: Vec<DocumentId> = self.entries.keys().copied().collect();
        let drained = ids.into_iter().filter_map(|id| self.forget(id)).collect();
        self.pending_adds = Vec::new();
        self.pending_removes = Vec::new();
        drained
    }

    /// Number of entries in any state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_tracked(&self, id: DocumentId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.state != EntryState::PendingRemove)
    }
}
