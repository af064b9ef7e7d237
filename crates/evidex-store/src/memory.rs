//! In-memory document store.
//!
//! Implements both adapter contracts over plain vectors. Handy for embedding
//! the pipeline without a database and for tests; `set_available(false)`
//! simulates an outage.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::adapter::{name_matcher, DocumentRetrieval, Documents, EntityDirectory};
use crate::types::{ExternalDocumentRecord, ImportBatch};
use evidex_core::{Error, Expert, Result};

#[derive(Default)]
struct MemoryData {
    /// (id, name) rows, duplicates allowed.
    authors: Vec<(String, String)>,
    /// (author ids, record).
    documents: Vec<(Vec<String>, ExternalDocumentRecord)>,
}

pub struct MemoryDocumentStore {
    source: String,
    data: RwLock<MemoryData>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            data: RwLock::new(MemoryData::default()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Build a store from an import batch.
    pub fn from_batch(source: impl Into<String>, batch: &ImportBatch) -> Self {
        let store = Self::new(source);
        for author in &batch.authors {
            store.add_author(&author.id, &author.name);
        }
        for doc in &batch.documents {
            let authors: Vec<&str> = doc.authors.iter().map(String::as_str).collect();
            store.add_document(
                &authors,
                ExternalDocumentRecord::new(
                    doc.year,
                    doc.title.as_deref(),
                    doc.abstract_text.as_deref(),
                ),
            );
        }
        store
    }

    pub fn add_author(&self, id: &str, name: &str) {
        self.data.write().authors.push((id.to_string(), name.to_string()));
    }

    pub fn add_document(&self, authors: &[&str], record: ExternalDocumentRecord) {
        let authors = authors.iter().map(|a| a.to_string()).collect();
        self.data.write().documents.push((authors, record));
    }

    /// Toggle the simulated connection.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of adapter calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::SourceUnavailable(format!(
                "in-memory store '{}' is offline",
                self.source
            )))
        }
    }

    fn experts(&self) -> Vec<Expert> {
        self.data
            .read()
            .authors
            .iter()
            .map(|(id, name)| {
                Expert::new(id.clone(), name.clone()).with_source_identifier(&self.source, id)
            })
            .collect()
    }
}

impl EntityDirectory for MemoryDocumentStore {
    fn list_all(&self) -> Result<HashSet<Expert>> {
        self.check_available()?;
        Ok(self.experts().into_iter().collect())
    }

    fn find_by_name(&self, pattern: &str) -> Result<HashSet<Expert>> {
        self.check_available()?;
        let matcher = name_matcher(pattern);
        Ok(self
            .experts()
            .into_iter()
            .filter(|e| matcher.is_match(e.name()))
            .collect())
    }
}

impl DocumentRetrieval for MemoryDocumentStore {
    fn fetch_for(&self, expert: &Expert) -> Result<Documents> {
        self.check_available()?;
        let author_id = expert.id_in_source(&self.source);
        let records: Vec<ExternalDocumentRecord> = self
            .data
            .read()
            .documents
            .iter()
            .filter(|(authors, _)| authors.iter().any(|a| a == author_id))
            .map(|(_, record)| record.clone())
            .collect();
        Ok(Box::new(records.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rows_collapse() {
        let store = MemoryDocumentStore::new("lexr");
        store.add_author("A1", "John Smith");
        store.add_author("A1", "john smith");
        store.add_author("A2", "Bob Lee");
        store.add_author("A2", "Bob Lee");
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_fetch_uses_source_identifier() {
        let store = MemoryDocumentStore::new("lexr");
        store.add_document(&["x-1"], ExternalDocumentRecord::new(Some(2020), Some("A"), None));
        store.add_document(&["x-2"], ExternalDocumentRecord::new(Some(2021), Some("B"), None));

        let expert = Expert::new("E1", "Someone").with_source_identifier("lexr", "x-1");
        let docs: Vec<_> = store.fetch_for(&expert).unwrap().collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].year, Some(2020));
    }

    #[test]
    fn test_offline_is_an_error_not_empty() {
        let store = MemoryDocumentStore::new("lexr");
        store.add_author("A1", "John Smith");
        store.set_available(false);
        assert!(store.list_all().unwrap_err().is_source_unavailable());
        assert!(store.find_by_name("john").unwrap_err().is_source_unavailable());
        assert_eq!(store.calls(), 2);
    }
}
