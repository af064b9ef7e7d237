//! Evidex Store: directory and retrieval adapters over the document store.

pub mod adapter;
pub mod connection;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use adapter::{name_matcher, DocumentRetrieval, Documents, EntityDirectory, NameMatcher};
pub use connection::{ConnectionStatus, Connector, ManagedConnection};
pub use memory::MemoryDocumentStore;
pub use sqlite::{SqliteConnector, SqliteDocumentStore};
pub use types::*;
