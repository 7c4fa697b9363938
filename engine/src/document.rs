//! Documents and the collections that hold them.
//!
//! A [`Document`] is a cheap, clonable handle: every clone points at the same
//! field map and nested-collection tree, so a `set` through one handle is
//! visible through all of them. Each map level is a [`DashMap`], which makes
//! single-key reads and writes safe from any thread. There is no atomicity
//! across keys.
//!
//! Ownership only flows downwards (collection → document → nested
//! collection → document ...). Documents hold no reference to their parent,
//! so dropping a document from its collection drops its whole subtree.

use crate::{CollectionName, DocumentId, FieldName, FieldValue};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Independent copy of a document's fields, sorted by name.
pub type Fields = BTreeMap<FieldName, FieldValue>;

/// A mapping of document ID to document, shared by handle.
///
/// Handles given out by the store are read-only views. Documents enter and
/// leave a collection only through [`Store`](crate::Store) or
/// [`Document::add_nested_document`]:
///
/// ```compile_fail
/// use docstore_engine::Store;
///
/// let store = Store::in_memory();
/// store.add_document("users", "u1");
/// let users = store.collection("users").unwrap();
/// users.remove("u1");
/// ```
#[derive(Clone, Default)]
pub struct Collection {
    documents: Arc<DashMap<DocumentId, Document>>,
}

impl Collection {
    /// Create an empty collection.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get a document by ID.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.documents.get(id).map(|doc| doc.clone())
    }

    /// Insert a document under its own ID, returning the one it replaced.
    pub(crate) fn insert(&self, document: Document) -> Option<Document> {
        self.documents.insert(document.id().to_string(), document)
    }

    /// Remove a document by ID.
    pub(crate) fn remove(&self, id: &str) -> Option<Document> {
        self.documents.remove(id).map(|(_, doc)| doc)
    }

    /// Check if a document exists.
    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// All documents, in no particular order.
    pub fn documents(&self) -> Vec<Document> {
        self.documents.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Copy of the ID → document mapping. The documents are shared handles.
    pub fn to_map(&self) -> HashMap<DocumentId, Document> {
        self.documents
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.documents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        f.debug_struct("Collection").field("documents", &ids).finish()
    }
}

struct DocumentInner {
    id: DocumentId,
    fields: DashMap<FieldName, FieldValue>,
    nested: DashMap<CollectionName, Collection>,
}

/// An identified bag of field values plus a tree of nested collections.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Document {
    /// Create an empty document.
    ///
    /// Only the store, a parent document, or the codec create documents.
    pub(crate) fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                id: id.into(),
                fields: DashMap::new(),
                nested: DashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Set a field, replacing any previous value.
    pub fn set(&self, name: impl Into<FieldName>, value: impl Into<FieldValue>) {
        self.inner.fields.insert(name.into(), value.into());
    }

    /// Get the current value of a field.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.inner.fields.get(name).map(|value| value.clone())
    }

    /// Copy of the current fields. Changing the copy leaves the document alone.
    pub fn snapshot(&self) -> Fields {
        self.inner
            .fields
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn field_count(&self) -> usize {
        self.inner.fields.len()
    }

    /// Create an empty document inside the named nested collection.
    ///
    /// The collection is created on first use. An existing document with the
    /// same ID is replaced.
    pub fn add_nested_document(
        &self,
        collection: impl Into<CollectionName>,
        id: impl Into<DocumentId>,
    ) -> Document {
        let document = Document::new(id);
        self.nested_collection_or_create(collection.into())
            .insert(document.clone());
        document
    }

    /// Get a document from a nested collection.
    pub fn get_nested_document(&self, collection: &str, id: &str) -> Option<Document> {
        self.inner.nested.get(collection)?.get(id)
    }

    /// All documents of a nested collection; empty if the collection is absent.
    pub fn get_nested_documents(&self, collection: &str) -> HashMap<DocumentId, Document> {
        self.inner
            .nested
            .get(collection)
            .map(|c| c.to_map())
            .unwrap_or_default()
    }

    /// The whole nested tree one level down: collection name → ID → document.
    pub fn nested_collections(&self) -> HashMap<CollectionName, HashMap<DocumentId, Document>> {
        self.inner
            .nested
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().to_map()))
            .collect()
    }

    /// Names of the nested collections, sorted.
    pub fn nested_collection_names(&self) -> Vec<CollectionName> {
        let mut names: Vec<_> = self.inner.nested.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn nested_collection_or_create(&self, name: CollectionName) -> Collection {
        // Clone the handle so the shard guard is released before the caller
        // touches the collection.
        self.inner.nested.entry(name).or_default().clone()
    }

    /// Whether two handles point at the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.inner.id)
            .field("fields", &self.snapshot())
            .field("nested", &self.nested_collection_names())
            .finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Document{{id='{}', data={{", self.inner.id)?;
        for (i, (name, value)) in self.snapshot().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str("}")?;

        let nested = self.nested_collection_names();
        if !nested.is_empty() {
            write!(f, ", nested=[{}]", nested.join(", "))?;
        }
        f.write_str("}")
    }
}
