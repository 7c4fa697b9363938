//! Store - the registry of top-level collections.
//!
//! The Store owns every collection and, through them, every document. Each
//! mutating operation is applied in memory first and then the entire tree is
//! written back to the configured file.

use crate::{
    error::Result, Collection, CollectionName, Document, DocumentId, DocumentSnapshot, Error,
    FieldValue, StoreConfig, StoreSnapshot,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use uuid::Uuid;

/// The main store holding all state.
#[derive(Debug)]
pub struct Store {
    /// Persistence settings; `None` keeps everything in memory
    config: Option<StoreConfig>,
    /// Collections by name
    collections: DashMap<CollectionName, Collection>,
    /// Serializes saves so they share the staging file one at a time
    save_lock: Mutex<()>,
}

impl Store {
    /// Open a store backed by the configured file.
    ///
    /// A missing file gives an empty store. So does a file that cannot be
    /// read or decoded; the problem is logged and the file is left as is
    /// until the next mutation overwrites it.
    pub fn open(config: StoreConfig) -> Self {
        let collections = DashMap::new();

        match load(&config) {
            Ok(Some(loaded)) => {
                for (name, collection) in loaded {
                    collections.insert(name, collection);
                }
                tracing::info!(
                    path = %config.path.display(),
                    collections = collections.len(),
                    "Store loaded"
                );
            }
            Ok(None) => {
                tracing::info!(path = %config.path.display(), "No store file, starting empty");
            }
            Err(e) => {
                tracing::warn!(
                    path = %config.path.display(),
                    error = %e,
                    "Failed to load store, starting empty"
                );
            }
        }

        Self {
            config: Some(config),
            collections,
            save_lock: Mutex::new(()),
        }
    }

    /// Create a store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            config: None,
            collections: DashMap::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Persistence settings, if the store is file-backed.
    pub fn config(&self) -> Option<&StoreConfig> {
        self.config.as_ref()
    }

    /// Ensure a top-level collection exists.
    pub fn create_collection(&self, name: &str) {
        self.collection_or_create(name);
        self.persist();
    }

    /// Generate a document ID: `<epoch millis>-<8 hex chars>`.
    ///
    /// Uniqueness is not checked against existing documents.
    pub fn generate_document_id() -> DocumentId {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
    }

    /// Add an empty document under a generated ID.
    pub fn add_document_with_auto_id(&self, collection: &str) -> Document {
        self.add_document(collection, Self::generate_document_id())
    }

    /// Add an empty document, creating the collection if needed.
    ///
    /// A document already stored under `id` is replaced without notice,
    /// together with everything nested beneath it.
    pub fn add_document(&self, collection: &str, id: impl Into<DocumentId>) -> Document {
        let document = Document::new(id);
        let replaced = self
            .collection_or_create(collection)
            .insert(document.clone());

        tracing::debug!(
            collection = %collection,
            id = %document.id(),
            replaced = replaced.is_some(),
            "Document added"
        );

        self.persist();
        document
    }

    /// Get a document by collection and ID.
    pub fn get_document(&self, collection: &str, id: &str) -> Option<Document> {
        self.collection(collection)?.get(id)
    }

    /// All documents of a collection, in no particular order.
    pub fn get_documents(&self, collection: &str) -> Vec<Document> {
        self.collection(collection)
            .map(|c| c.documents())
            .unwrap_or_default()
    }

    /// Remove a document and its nested tree.
    ///
    /// Returns `true` if a document was removed.
    pub fn delete_document(&self, collection: &str, id: &str) -> bool {
        let removed = self
            .collection(collection)
            .and_then(|c| c.remove(id))
            .is_some();

        if removed {
            tracing::debug!(collection = %collection, id = %id, "Document deleted");
            self.persist();
        }
        removed
    }

    /// Documents whose `field` is present and equal to `value`.
    pub fn find_documents(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> Vec<Document> {
        self.get_documents(collection)
            .into_iter()
            .filter(|doc| doc.get(field).as_ref() == Some(value))
            .collect()
    }

    /// Set one field on a top-level document and persist.
    ///
    /// Returns `false` if the document does not exist.
    pub fn update_document_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> bool {
        match self.get_document(collection, id) {
            Some(document) => {
                document.set(field, value);
                tracing::debug!(collection = %collection, id = %id, field = %field, "Field updated");
                self.persist();
                true
            }
            None => false,
        }
    }

    /// Resolve a document one level below a top-level document.
    pub fn get_nested_document(
        &self,
        collection: &str,
        id: &str,
        nested_collection: &str,
        nested_id: &str,
    ) -> Option<Document> {
        self.get_document(collection, id)?
            .get_nested_document(nested_collection, nested_id)
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<Collection> {
        self.collections.get(name).map(|c| c.clone())
    }

    /// Names of the top-level collections, sorted.
    pub fn collection_names(&self) -> Vec<CollectionName> {
        let mut names: Vec<_> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of top-level documents across all collections.
    pub fn document_count(&self) -> usize {
        self.collections.iter().map(|e| e.value().len()).sum()
    }

    /// Export the current store state as a snapshot.
    pub fn export_state(&self) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::new();
        for entry in self.collections.iter() {
            let documents = entry
                .value()
                .documents()
                .iter()
                .map(|doc| (doc.id().to_string(), DocumentSnapshot::capture(doc)))
                .collect();
            snapshot.collections.insert(entry.key().clone(), documents);
        }
        snapshot
    }

    /// Replace the whole state with a snapshot and persist.
    ///
    /// Nothing changes if the snapshot cannot be restored.
    pub fn import_state(&self, snapshot: StoreSnapshot) -> Result<()> {
        let collections = snapshot.restore()?;

        self.collections.clear();
        for (name, collection) in collections {
            self.collections.insert(name, collection);
        }

        self.persist();
        Ok(())
    }

    /// Write the whole state to the store file.
    ///
    /// Needed after changing documents through their handles; every store
    /// mutation already does this. A no-op for in-memory stores.
    ///
    /// Concurrent saves run one after another, capture included, so the file
    /// left by the last save to finish holds every mutation completed before it.
    pub fn save(&self) -> Result<()> {
        let Some(config) = &self.config else {
            return Ok(());
        };

        let _guard = self.save_lock.lock();
        let json = self.export_state().to_json_pretty()?;

        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        // Write aside, then swap in, so a failed write keeps the old file.
        let staging = config.staging_path();
        fs::write(&staging, json).map_err(|e| Error::io(&staging, e))?;
        fs::rename(&staging, &config.path).map_err(|e| Error::io(&config.path, e))?;

        Ok(())
    }

    /// Save, logging instead of failing. The in-memory change stands either way.
    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "Failed to save store");
        }
    }

    fn collection_or_create(&self, name: &str) -> Collection {
        if let Some(collection) = self.collection(name) {
            return collection;
        }
        self.collections
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

/// Read and rebuild the collections stored at `config.path`.
///
/// `Ok(None)` means there is no file yet.
fn load(config: &StoreConfig) -> Result<Option<Vec<(CollectionName, Collection)>>> {
    let json = match fs::read_to_string(&config.path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(&config.path, e)),
    };

    let collections = StoreSnapshot::from_json(&json)?.restore()?;
    Ok(Some(collections))
}
