//! # Docstore Engine
//!
//! An embedded, in-process document store.
//!
//! Data lives in named collections of documents. A document is an ID, a set
//! of typed fields and, optionally, named collections of further documents
//! nested inside it, to any depth. The whole state is kept in memory and
//! written to one JSON file after every mutation.
//!
//! ## Core Concepts
//!
//! ### Field values
//!
//! A [`FieldValue`] is either an `Integer` or a `Text`. Equality is strict:
//! `Integer(25)` never matches `Text("25")`.
//!
//! ### Documents
//!
//! A [`Document`] is a shared handle. Setting a field through any handle is
//! visible through every other handle to the same document. Nested documents
//! are created with [`Document::add_nested_document`].
//!
//! ### Store
//!
//! The [`Store`] owns the top-level collections and provides creation,
//! lookup, deletion and single-field equality search. Lookups that miss
//! return `None`, `false` or an empty `Vec`; they never fail.
//!
//! ## Quick Start
//!
//! ```rust
//! use docstore_engine::{FieldValue, Store};
//!
//! let store = Store::in_memory();
//!
//! let user = store.add_document("users", "u1");
//! user.set("name", "Ada");
//! user.set("age", 36);
//!
//! let found = store.find_documents("users", "age", &FieldValue::Integer(36));
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].id(), "u1");
//!
//! // Text "36" is a different value.
//! assert!(store.find_documents("users", "age", &"36".into()).is_empty());
//! ```
//!
//! ## Persistence
//!
//! [`Store::open`] reads the file named by [`StoreConfig`] and every mutating
//! operation rewrites it. Changes made directly on a [`Document`] handle are
//! written on the next mutation or an explicit [`Store::save`]. A missing or
//! unreadable file yields an empty store; persistence problems are logged and
//! never abort the caller.

pub mod config;
pub mod document;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod value;

// Re-export main types at crate root
pub use config::{StoreConfig, DEFAULT_STORE_PATH};
pub use document::{Collection, Document, Fields};
pub use error::{Error, Result};
pub use snapshot::{CollectionSnapshot, DocumentSnapshot, StoreSnapshot};
pub use store::Store;
pub use value::FieldValue;

/// Type aliases for clarity
pub type CollectionName = String;
pub type DocumentId = String;
pub type FieldName = String;
