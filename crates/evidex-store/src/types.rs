//! Raw record shapes exchanged with the document store.

use serde::{Deserialize, Serialize};

/// A bibliographic record exactly as the store holds it; every field may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocumentRecord {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Untouched source payload, kept for provenance.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl ExternalDocumentRecord {
    pub fn new(year: Option<i32>, title: Option<&str>, abstract_text: Option<&str>) -> Self {
        let raw = serde_json::json!({
            "year": year,
            "title": title,
            "abstract": abstract_text,
        });
        Self {
            year,
            title: title.map(str::to_string),
            abstract_text: abstract_text.map(str::to_string),
            raw,
        }
    }
}

/// An author row for bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRow {
    pub id: String,
    pub name: String,
}

/// A document row for bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRow {
    /// Store id; derived from the content when omitted.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Source-specific ids of the authors.
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Contents of an import file: `{"authors": [...], "documents": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportBatch {
    #[serde(default)]
    pub authors: Vec<AuthorRow>,
    #[serde(default)]
    pub documents: Vec<DocumentRow>,
}

/// Counts of what an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub authors: usize,
    pub documents: usize,
    pub authorships: usize,
}
