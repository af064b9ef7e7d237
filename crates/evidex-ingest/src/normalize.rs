//! Evidence normalization: one external document record → zero or one
//! evidence record.

use std::sync::Arc;

use tracing::debug;

use evidex_core::{year_start, Error, EvidenceRecord, Expert, Provenance, Result, SourceInputRef};
use evidex_store::ExternalDocumentRecord;

/// Turns raw store records into evidence.
#[derive(Debug, Clone)]
pub struct Normalizer {
    source_label: String,
}

impl Normalizer {
    /// `source_label` is written into every record's provenance.
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
        }
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Normalize one record, or `None` when it carries no text.
    pub fn normalize(
        &self,
        expert: &Arc<Expert>,
        record: &ExternalDocumentRecord,
        input: &SourceInputRef,
    ) -> Option<EvidenceRecord> {
        match self.try_normalize(expert, record, input) {
            Ok(evidence) => Some(evidence),
            Err(e) => {
                debug!("Skipping record for {}: {}", expert.id(), e);
                None
            }
        }
    }

    /// Like [`normalize`](Self::normalize), but reports why a record was
    /// rejected.
    pub fn try_normalize(
        &self,
        expert: &Arc<Expert>,
        record: &ExternalDocumentRecord,
        input: &SourceInputRef,
    ) -> Result<EvidenceRecord> {
        let text = compose_text(record.title.as_deref(), record.abstract_text.as_deref());
        if text.is_empty() {
            return Err(Error::MalformedRecord(format!(
                "no title or abstract (year: {})",
                record
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "unknown".into())
            )));
        }

        let keywords: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let timestamp = year_start(record.year);
        if record.year.is_some() && timestamp.is_none() {
            debug!("Year {:?} out of calendar range, treating as unknown", record.year);
        }

        Ok(
            EvidenceRecord::new(Arc::clone(expert), keywords, timestamp, input.clone())
                .with_provenance(Provenance {
                    source: self.source_label.clone(),
                    retrieved: render_retrieved(record),
                }),
        )
    }
}

/// Trimmed title, then a space and the trimmed abstract when it is not
/// blank, trimmed again.
pub fn compose_text(title: Option<&str>, abstract_text: Option<&str>) -> String {
    let mut text = title.map(str::trim).unwrap_or("").to_string();
    if let Some(abs) = abstract_text.map(str::trim).filter(|a| !a.is_empty()) {
        text.push(' ');
        text.push_str(abs);
    }
    text.trim().to_string()
}

/// Display summary of the fields a record was built from. Absent fields
/// render empty.
pub fn render_retrieved(record: &ExternalDocumentRecord) -> String {
    format!(
        "Year: {}\nTitle: {}\nAbstract: {}",
        record.year.map(|y| y.to_string()).unwrap_or_default(),
        record.title.as_deref().unwrap_or(""),
        record.abstract_text.as_deref().unwrap_or(""),
    )
}
