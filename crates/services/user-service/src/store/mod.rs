//! Store ports and the in-memory adapters.
//!
//! The service layer only talks to [`DocumentStore`] and [`ObjectStore`];
//! concrete backends are injected at construction.

mod document;
pub mod memory;
mod object;
mod query;
mod value;

pub use document::{generate_id, DocumentStore};
pub use memory::{MemoryDocumentStore, MemoryObjectStore};
pub use object::{key_from_location, object_url, ObjectStore};
pub use query::{Direction, FieldFilter, FilterOp, OrderBy, Query};
pub use value::{Document, FieldValue, Fields};

#[cfg(any(test, feature = "test-utils"))]
pub use document::MockDocumentStore;
#[cfg(any(test, feature = "test-utils"))]
pub use object::MockObjectStore;
