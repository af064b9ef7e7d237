//! Runtime types.

use serde::Serialize;

use evidex_core::{EvidenceRecord, Expert, Locale};

/// Per-run counters of one evidence collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectStats {
    /// Documents the retrieval adapter returned.
    pub fetched: usize,
    /// Documents without usable text.
    pub skipped: usize,
    /// Distinct raw evidence records handed to the technique.
    pub raw_evidence: usize,
    /// Records the technique returned.
    pub refined: usize,
}

/// Refined evidence for one expert, with the settings that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceReport {
    pub expert: Expert,
    pub technique: String,
    pub language: Locale,
    pub stats: CollectStats,
    /// Ordered by timestamp, then keywords.
    pub evidence: Vec<EvidenceRecord>,
}
