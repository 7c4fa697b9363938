//! Snapshot types for persisting and restoring store state.
//!
//! A snapshot is a plain, owned copy of the document tree. Capturing one from
//! the live store and restoring a store from one are the only places the
//! JSON encoding is known:
//!
//! ```json
//! {
//!   "users": {
//!     "u1": {
//!       "id": "u1",
//!       "data": { "name": "Ada", "age": 36 },
//!       "nestedCollections": { "orders": { "o1": { "id": "o1", "data": {} } } }
//!     }
//!   }
//! }
//! ```
//!
//! Sorted maps keep the output deterministic.

use crate::{
    document::Fields, error::Result, Collection, CollectionName, Document, DocumentId, Error,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Documents of one collection, keyed by ID.
pub type CollectionSnapshot = BTreeMap<DocumentId, DocumentSnapshot>;

/// Owned copy of one document and everything nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    #[serde(default)]
    pub data: Fields,
    #[serde(default)]
    pub nested_collections: BTreeMap<CollectionName, CollectionSnapshot>,
}

impl DocumentSnapshot {
    /// Capture a live document, recursively.
    pub fn capture(document: &Document) -> Self {
        let nested_collections = document
            .nested_collections()
            .into_iter()
            .map(|(name, documents)| {
                let documents = documents
                    .into_iter()
                    .map(|(id, doc)| (id, Self::capture(&doc)))
                    .collect();
                (name, documents)
            })
            .collect();

        Self {
            id: document.id().to_string(),
            data: document.snapshot(),
            nested_collections,
        }
    }

    /// Build a live document from this snapshot.
    pub fn restore(self) -> Result<Document> {
        let document = Document::new(self.id);
        for (name, value) in self.data {
            document.set(name, value);
        }
        for (name, documents) in self.nested_collections {
            let collection = document.nested_collection_or_create(name);
            restore_into(&collection, documents)?;
        }
        Ok(document)
    }

    /// Count this document and all of its descendants.
    pub fn document_count(&self) -> usize {
        1 + self
            .nested_collections
            .values()
            .flat_map(|c| c.values())
            .map(|d| d.document_count())
            .sum::<usize>()
    }
}

fn restore_into(collection: &Collection, documents: CollectionSnapshot) -> Result<()> {
    for (key, snapshot) in documents {
        if key != snapshot.id {
            return Err(Error::KeyMismatch {
                key,
                id: snapshot.id,
            });
        }
        collection.insert(snapshot.restore()?);
    }
    Ok(())
}

/// A point-in-time copy of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    pub collections: BTreeMap<CollectionName, CollectionSnapshot>,
}

impl StoreSnapshot {
    /// Create a new empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document snapshot to the snapshot, creating its collection.
    pub fn add_document(&mut self, collection: impl Into<CollectionName>, doc: DocumentSnapshot) {
        self.collections
            .entry(collection.into())
            .or_default()
            .insert(doc.id.clone(), doc);
    }

    /// Get a top-level document snapshot.
    pub fn get_document(&self, collection: &str, id: &str) -> Option<&DocumentSnapshot> {
        self.collections.get(collection)?.get(id)
    }

    /// Count documents at every depth.
    pub fn document_count(&self) -> usize {
        self.collections
            .values()
            .flat_map(|c| c.values())
            .map(|d| d.document_count())
            .sum()
    }

    /// Build the live collections this snapshot describes.
    ///
    /// Fails as a whole: either every collection is rebuilt or none is
    /// returned.
    pub fn restore(self) -> Result<Vec<(CollectionName, Collection)>> {
        let mut restored = Vec::with_capacity(self.collections.len());
        for (name, documents) in self.collections {
            let collection = Collection::new();
            restore_into(&collection, documents)?;
            restored.push((name, collection));
        }
        Ok(restored)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Serialize to pretty JSON, the on-disk format.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// Nesting depth is unlimited; the stack grows on demand instead of the
    /// parser enforcing a recursion limit.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut json_de = serde_json::Deserializer::from_str(json);
        json_de.disable_recursion_limit();

        let snapshot = Self::deserialize(serde_stacker::Deserializer::new(&mut json_de))
            .map_err(|e| Error::Decode(e.to_string()))?;
        json_de.end().map_err(|e| Error::Decode(e.to_string()))?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldValue;
    use serde_json::json;

    fn sample_user() -> Document {
        let user = Document::new("u1");
        user.set("name", "Ada");
        user.set("age", 36);
        let order = user.add_nested_document("orders", "o1");
        order.set("total", 120);
        order.add_nested_document("items", "i1").set("sku", "A-1");
        user
    }

    #[test]
    fn create_empty_snapshot() {
        let snapshot = StoreSnapshot::new();
        assert_eq!(snapshot.document_count(), 0);
        assert_eq!(snapshot.to_json().unwrap(), "{}");
    }

    #[test]
    fn encoding_layout() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.add_document("users", DocumentSnapshot::capture(&sample_user()));

        let value: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "users": {
                    "u1": {
                        "id": "u1",
                        "data": {"age": 36, "name": "Ada"},
                        "nestedCollections": {
                            "orders": {
                                "o1": {
                                    "id": "o1",
                                    "data": {"total": 120},
                                    "nestedCollections": {
                                        "items": {
                                            "i1": {
                                                "id": "i1",
                                                "data": {"sku": "A-1"},
                                                "nestedCollections": {}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn capture_and_restore() {
        let snapshot = DocumentSnapshot::capture(&sample_user());
        assert_eq!(snapshot.document_count(), 3);

        let restored = snapshot.clone().restore().unwrap();
        assert_eq!(restored.id(), "u1");
        assert_eq!(restored.get("age"), Some(FieldValue::Integer(36)));

        let item = restored
            .get_nested_document("orders", "o1")
            .unwrap()
            .get_nested_document("items", "i1")
            .unwrap();
        assert_eq!(item.get("sku"), Some(FieldValue::from("A-1")));

        assert_eq!(DocumentSnapshot::capture(&restored), snapshot);
    }

    #[test]
    fn json_roundtrip() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.add_document("users", DocumentSnapshot::capture(&sample_user()));
        snapshot.collections.insert("empty".into(), BTreeMap::new());

        let json = snapshot.to_json_pretty().unwrap();
        let restored = StoreSnapshot::from_json(&json).unwrap();

        assert_eq!(snapshot, restored);
        assert!(restored.collections["empty"].is_empty());
    }

    #[test]
    fn deterministic_serialization() {
        let a = Document::new("a");
        let b = Document::new("b");

        let mut snapshot1 = StoreSnapshot::new();
        snapshot1.add_document("users", DocumentSnapshot::capture(&a));
        snapshot1.add_document("users", DocumentSnapshot::capture(&b));

        let mut snapshot2 = StoreSnapshot::new();
        snapshot2.add_document("users", DocumentSnapshot::capture(&b));
        snapshot2.add_document("users", DocumentSnapshot::capture(&a));

        assert_eq!(snapshot1.to_json().unwrap(), snapshot2.to_json().unwrap());
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let json = r#"{"users": {"u1": {"id": "u1"}}}"#;
        let snapshot = StoreSnapshot::from_json(json).unwrap();

        let doc = snapshot.get_document("users", "u1").unwrap();
        assert!(doc.data.is_empty());
        assert!(doc.nested_collections.is_empty());
    }

    #[test]
    fn reject_missing_id() {
        let json = r#"{"users": {"u1": {"data": {"name": "Ada"}}}}"#;
        let result = StoreSnapshot::from_json(json);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn reject_unsupported_field_types() {
        let json = r#"{"users": {"u1": {"id": "u1", "data": {"score": 1.5}}}}"#;
        assert!(matches!(
            StoreSnapshot::from_json(json),
            Err(Error::Decode(_))
        ));

        let json = r#"{"users": {"u1": {"id": "u1", "data": {"active": true}}}}"#;
        assert!(matches!(
            StoreSnapshot::from_json(json),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn reject_malformed_json() {
        assert!(matches!(
            StoreSnapshot::from_json("{ not json"),
            Err(Error::Decode(_))
        ));
        assert!(matches!(
            StoreSnapshot::from_json("[]"),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn reject_trailing_content() {
        assert!(matches!(
            StoreSnapshot::from_json(r#"{"users": {}} {"#),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn decode_beyond_default_recursion_limit() {
        let root = Document::new("root");
        let mut current = root.clone();
        for depth in 0..200 {
            current = current.add_nested_document("child", format!("n{}", depth));
        }
        current.set("leaf", "bottom");

        let mut snapshot = StoreSnapshot::new();
        snapshot.add_document("tree", DocumentSnapshot::capture(&root));
        let json = snapshot.to_json().unwrap();

        let decoded = StoreSnapshot::from_json(&json).unwrap();
        assert_eq!(decoded.document_count(), 201);
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn reject_key_mismatch() {
        let json = r#"{"users": {"u1": {"id": "u2"}}}"#;
        let snapshot = StoreSnapshot::from_json(json).unwrap();

        let result = snapshot.restore();
        assert!(matches!(
            result,
            Err(Error::KeyMismatch { ref key, ref id }) if key == "u1" && id == "u2"
        ));
    }

    #[test]
    fn reject_nested_key_mismatch() {
        let json = r#"{"users": {"u1": {"id": "u1", "nestedCollections": {"orders": {"o1": {"id": "oops"}}}}}}"#;
        let snapshot = StoreSnapshot::from_json(json).unwrap();
        assert!(matches!(snapshot.restore(), Err(Error::KeyMismatch { .. })));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_value() -> impl Strategy<Value = FieldValue> {
            prop_oneof![
                any::<i64>().prop_map(FieldValue::Integer),
                "[a-zA-Z0-9 ]{0,12}".prop_map(FieldValue::Text),
            ]
        }

        fn arb_fields() -> impl Strategy<Value = Fields> {
            prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..5)
        }

        fn arb_document(id: String) -> impl Strategy<Value = DocumentSnapshot> {
            let leaf = arb_fields().prop_map(move |data| DocumentSnapshot {
                id: id.clone(),
                data,
                nested_collections: BTreeMap::new(),
            });
            leaf.prop_recursive(4, 32, 3, |inner| {
                (
                    inner.clone(),
                    prop::collection::btree_map(
                        "[a-z]{1,5}",
                        prop::collection::vec(inner, 0..3),
                        0..3,
                    ),
                )
                    .prop_map(|(mut parent, children)| {
                        for (name, docs) in children {
                            let collection = parent.nested_collections.entry(name).or_default();
                            for (i, mut child) in docs.into_iter().enumerate() {
                                child.id = format!("{}-{}", child.id, i);
                                collection.insert(child.id.clone(), child);
                            }
                        }
                        parent
                    })
            })
        }

        proptest! {
            #[test]
            fn prop_json_roundtrip_is_lossless(doc in arb_document("d".to_string())) {
                let mut snapshot = StoreSnapshot::new();
                snapshot.add_document("things", doc);

                let json = snapshot.to_json_pretty().unwrap();
                let decoded = StoreSnapshot::from_json(&json).unwrap();
                prop_assert_eq!(&decoded, &snapshot);

                // Through live documents and back.
                let live = decoded.restore().unwrap();
                let mut recaptured = StoreSnapshot::new();
                for (name, collection) in live {
                    for document in collection.documents() {
                        recaptured.add_document(name.clone(), DocumentSnapshot::capture(&document));
                    }
                }
                prop_assert_eq!(recaptured, snapshot);
            }
        }
    }
}
