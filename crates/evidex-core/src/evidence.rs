//! Evidence records and their provenance.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::expert::Expert;

/// Names the configured input pipeline that produced a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceInputRef(String);

impl SourceInputRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceInputRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for SourceInputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the raw text of a record came from. Display/audit only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Provenance {
    /// Label of the source, e.g. `"LexR record"`.
    pub source: String,
    /// Human-readable dump of the fields the text was built from.
    pub retrieved: String,
}

/// One unit of evidence for an expert.
///
/// Equality and hashing cover `expert`, `keywords`, `timestamp` and `input`.
/// Provenance, weights and topic are annotations: two fetches of the same
/// document compare equal even if the source rendered them differently, so a
/// `HashSet<EvidenceRecord>` never double counts.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceRecord {
    expert: Arc<Expert>,
    keywords: Vec<String>,
    /// January 1 of the source year; `None` when the year is unknown.
    timestamp: Option<NaiveDate>,
    input: SourceInputRef,
    provenance: Provenance,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    weights: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    topic: Option<usize>,
}

impl EvidenceRecord {
    pub fn new(
        expert: Arc<Expert>,
        keywords: Vec<String>,
        timestamp: Option<NaiveDate>,
        input: SourceInputRef,
    ) -> Self {
        Self {
            expert,
            keywords,
            timestamp,
            input,
            provenance: Provenance::default(),
            weights: Vec::new(),
            topic: None,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Attach weights parallel to `keywords`.
    ///
    /// A length mismatch is a programming error in the caller; the weights
    /// are truncated or padded with zero to keep the two sequences aligned.
    pub fn with_weights(mut self, mut weights: Vec<f64>) -> Self {
        weights.resize(self.keywords.len(), 0.0);
        self.weights = weights;
        self
    }

    pub fn with_topic(mut self, topic: usize) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Derive a new record with replaced keywords and weights, keeping the
    /// expert, timestamp, input and provenance of `self`.
    pub fn refine(&self, keywords: Vec<String>, weights: Vec<f64>) -> Self {
        Self {
            expert: Arc::clone(&self.expert),
            keywords,
            timestamp: self.timestamp,
            input: self.input.clone(),
            provenance: self.provenance.clone(),
            weights: Vec::new(),
            topic: self.topic,
        }
        .with_weights(weights)
    }

    pub fn expert(&self) -> &Arc<Expert> {
        &self.expert
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn timestamp(&self) -> Option<NaiveDate> {
        self.timestamp
    }

    /// Year of the timestamp, if known.
    pub fn year(&self) -> Option<i32> {
        self.timestamp.map(|d| d.year())
    }

    pub fn input(&self) -> &SourceInputRef {
        &self.input
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn topic(&self) -> Option<usize> {
        self.topic
    }

    /// Keyword/weight pairs. Empty when the record carries no weights.
    pub fn weighted_keywords(&self) -> impl Iterator<Item = (&str, f64)> {
        self.keywords
            .iter()
            .zip(self.weights.iter())
            .map(|(k, w)| (k.as_str(), *w))
    }
}

impl PartialEq for EvidenceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.expert.id() == other.expert.id()
            && self.keywords == other.keywords
            && self.timestamp == other.timestamp
            && self.input == other.input
    }
}

impl Eq for EvidenceRecord {}

impl Hash for EvidenceRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expert.id().hash(state);
        self.keywords.hash(state);
        self.timestamp.hash(state);
        self.input.hash(state);
    }
}

/// January 1 of `year`, or `None` for an absent or unrepresentable year.
pub fn year_start(year: Option<i32>) -> Option<NaiveDate> {
    year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
}
