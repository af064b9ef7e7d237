//! The extraction strategy contract and construction from configuration.

use std::cmp::Ordering;
use std::collections::HashSet;

use evidex_core::{EvidenceRecord, Expert, ExtractionConfig, Locale, TechniqueKind};

use crate::keygraph::GraphKeyword;
use crate::term_frequency::{FrequencyReweighted, TermFrequency};
use crate::topics::{RawTerms, TopicModeled};

/// Refines a raw evidence batch into weighted, deduplicated evidence.
///
/// Implementations never fail: an empty batch yields an empty set, and an
/// unsupported locale degrades to language-agnostic processing. Every
/// output record keeps the expert, timestamp and input of the raw record it
/// was derived from.
pub trait ExtractionTechnique: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        expert: &Expert,
        raw: HashSet<EvidenceRecord>,
        language: &Locale,
    ) -> HashSet<EvidenceRecord>;
}

/// Turns a configured [`TechniqueKind`] into a ready strategy.
pub trait BuildTechnique {
    fn build(self, config: &ExtractionConfig) -> Box<dyn ExtractionTechnique>;
}

impl BuildTechnique for TechniqueKind {
    fn build(self, config: &ExtractionConfig) -> Box<dyn ExtractionTechnique> {
        match self {
            TechniqueKind::TermFrequency => Box::new(TermFrequency::new(config)),
            TechniqueKind::GraphKeyword => Box::new(GraphKeyword::new(config)),
            TechniqueKind::TermFrequencyTopics => Box::new(TopicModeled::new(
                self.name(),
                Box::new(TermFrequency::new(config)),
                config.topics,
            )),
            TechniqueKind::GraphKeywordTopics => Box::new(TopicModeled::new(
                self.name(),
                Box::new(GraphKeyword::new(config)),
                config.topics,
            )),
            TechniqueKind::GraphKeywordTermFrequency => Box::new(FrequencyReweighted::new(
                self.name(),
                Box::new(GraphKeyword::new(config)),
                config,
            )),
            TechniqueKind::Topics => Box::new(TopicModeled::new(
                self.name(),
                Box::new(RawTerms::new(config)),
                config.topics,
            )),
        }
    }
}

/// Distinct terms ordered by descending weight, ties by term, cut to
/// `max_keywords` (0 keeps all).
pub(crate) fn rank_terms(
    mut scored: Vec<(String, f64)>,
    max_keywords: usize,
) -> (Vec<String>, Vec<f64>) {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.dedup_by(|a, b| a.0 == b.0);
    if max_keywords > 0 {
        scored.truncate(max_keywords);
    }
    scored.into_iter().unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::{year_start, SourceInputRef};
    use std::sync::Arc;

    fn raw_batch() -> HashSet<EvidenceRecord> {
        let expert = Arc::new(Expert::new("E1", "Expert One"));
        [
            (2018, "Graph mining for citation networks"),
            (2020, "Mining frequent subgraphs in large graph databases"),
            (2021, "Neural ranking of legal documents"),
        ]
        .iter()
        .map(|(year, text)| {
            EvidenceRecord::new(
                Arc::clone(&expert),
                text.split_whitespace().map(str::to_string).collect(),
                year_start(Some(*year)),
                SourceInputRef::new("lexr"),
            )
        })
        .collect()
    }

    #[test]
    fn test_every_kind_builds_with_its_name() {
        let config = ExtractionConfig::default();
        for kind in TechniqueKind::all() {
            let technique = kind.build(&config);
            assert_eq!(technique.name(), kind.name());
        }
    }

    #[test]
    fn test_empty_in_empty_out() {
        let config = ExtractionConfig::default();
        let expert = Expert::new("E1", "Expert One");
        for kind in TechniqueKind::all() {
            let out = kind
                .build(&config)
                .generate(&expert, HashSet::new(), &Locale::new("en"));
            assert!(out.is_empty(), "{} produced output from nothing", kind);
        }
    }

    #[test]
    fn test_outputs_keep_expert_and_timestamps() {
        let config = ExtractionConfig::default();
        let expert = Expert::new("E1", "Expert One");
        let raw = raw_batch();
        let in_stamps: HashSet<_> = raw.iter().map(|r| r.timestamp()).collect();

        for kind in TechniqueKind::all() {
            let out = kind
                .build(&config)
                .generate(&expert, raw.clone(), &Locale::new("en"));
            assert!(!out.is_empty(), "{} dropped everything", kind);
            for record in &out {
                assert_eq!(record.expert().id(), "E1");
                assert!(in_stamps.contains(&record.timestamp()));
                assert_eq!(record.input().as_str(), "lexr");
                assert_eq!(record.weights().len(), record.keywords().len());
            }
        }
    }

    #[test]
    fn test_unsupported_locale_still_produces_evidence() {
        let config = ExtractionConfig::default();
        let expert = Expert::new("E1", "Expert One");
        for kind in TechniqueKind::all() {
            let out = kind
                .build(&config)
                .generate(&expert, raw_batch(), &Locale::new("tlh"));
            assert!(!out.is_empty(), "{} gave up on an unknown locale", kind);
        }
    }

    #[test]
    fn test_rank_terms_orders_and_truncates() {
        let scored = vec![
            ("beta".to_string(), 0.5),
            ("alpha".to_string(), 0.5),
            ("gamma".to_string(), 1.0),
            ("alpha".to_string(), 0.5),
            ("delta".to_string(), 0.1),
        ];
        let (terms, weights) = rank_terms(scored, 3);
        assert_eq!(terms, vec!["gamma", "alpha", "beta"]);
        assert_eq!(weights, vec![1.0, 0.5, 0.5]);
    }
}
