//! Term-frequency weighting across the whole batch.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use evidex_core::{EvidenceRecord, Expert, ExtractionConfig, Locale};

use crate::technique::{rank_terms, ExtractionTechnique};
use crate::tokenize::{PreparedRecord, Preprocessor};

/// Weight of a term = its count over the batch / the highest count.
#[derive(Debug, Clone)]
pub struct TermFrequency {
    max_keywords: usize,
    min_token_len: usize,
}

impl TermFrequency {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_keywords: config.max_keywords,
            min_token_len: config.min_token_len,
        }
    }
}

impl ExtractionTechnique for TermFrequency {
    fn name(&self) -> &str {
        "term-frequency"
    }

    fn generate(
        &self,
        expert: &Expert,
        raw: HashSet<EvidenceRecord>,
        language: &Locale,
    ) -> HashSet<EvidenceRecord> {
        if raw.is_empty() {
            return HashSet::new();
        }

        let prepared = Preprocessor::for_locale(language, self.min_token_len).prepare(raw);
        let weights = batch_weights(&prepared);
        if weights.is_empty() {
            debug!("No usable terms for {}", expert.id());
            return HashSet::new();
        }

        let out: HashSet<EvidenceRecord> = prepared
            .iter()
            .filter_map(|p| {
                let scored = p
                    .terms
                    .iter()
                    .map(|t| (t.clone(), weights[t.as_str()]))
                    .collect();
                let (keywords, weights) = rank_terms(scored, self.max_keywords);
                if keywords.is_empty() {
                    return None;
                }
                Some(p.record.refine(keywords, weights))
            })
            .collect();

        debug!(
            "term-frequency: {} terms, {} records for {}",
            weights.len(),
            out.len(),
            expert.id()
        );
        out
    }
}

/// Count of every term over the batch divided by the highest count.
pub(crate) fn batch_weights(prepared: &[PreparedRecord]) -> HashMap<String, f64> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for p in prepared {
        for term in &p.terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    if max_count == 0 {
        return HashMap::new();
    }
    counts
        .into_iter()
        .map(|(term, n)| (term.to_string(), n as f64 / max_count as f64))
        .collect()
}

/// Keeps the keywords another technique selected but weighs them by batch
/// term frequency.
pub struct FrequencyReweighted {
    name: String,
    inner: Box<dyn ExtractionTechnique>,
    min_token_len: usize,
}

impl FrequencyReweighted {
    pub fn new(
        name: impl Into<String>,
        inner: Box<dyn ExtractionTechnique>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            name: name.into(),
            inner,
            min_token_len: config.min_token_len,
        }
    }
}

impl ExtractionTechnique for FrequencyReweighted {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        expert: &Expert,
        raw: HashSet<EvidenceRecord>,
        language: &Locale,
    ) -> HashSet<EvidenceRecord> {
        if raw.is_empty() {
            return HashSet::new();
        }

        let prepared = Preprocessor::for_locale(language, self.min_token_len).prepare(raw.clone());
        let weights = batch_weights(&prepared);

        let out: HashSet<EvidenceRecord> = self
            .inner
            .generate(expert, raw, language)
            .into_iter()
            .map(|r| {
                let scored = r
                    .keywords()
                    .iter()
                    .map(|k| (k.clone(), weights.get(k).copied().unwrap_or(0.0)))
                    .collect();
                let (keywords, weights) = rank_terms(scored, 0);
                r.refine(keywords, weights)
            })
            .collect();

        debug!("{}: {} records for {}", self.name, out.len(), expert.id());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::{year_start, SourceInputRef, TechniqueKind};
    use std::sync::Arc;

    use crate::keygraph::GraphKeyword;
    use crate::technique::BuildTechnique;

    fn batch(texts: &[(i32, &str)]) -> HashSet<EvidenceRecord> {
        let expert = Arc::new(Expert::new("E1", "Expert One"));
        texts
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

    fn by_year(out: &HashSet<EvidenceRecord>, year: i32) -> &EvidenceRecord {
        out.iter().find(|r| r.year() == Some(year)).unwrap()
    }

    #[test]
    fn test_weights_are_relative_to_top_count() {
        let tf = TermFrequency::new(&ExtractionConfig::default());
        let out = tf.generate(
            &Expert::new("E1", "Expert One"),
            batch(&[
                (2019, "graph mining graph"),
                (2020, "graph databases"),
                (2021, "mining"),
            ]),
            &Locale::new("en"),
        );
        assert_eq!(out.len(), 3);

        let first = by_year(&out, 2019);
        assert_eq!(first.keywords(), &["graph", "mining"]);
        assert_eq!(first.weights(), &[1.0, 2.0 / 3.0]);

        let second = by_year(&out, 2020);
        assert_eq!(second.keywords(), &["graph", "databases"]);
        assert_eq!(second.weights(), &[1.0, 1.0 / 3.0]);
    }

    #[test]
    fn test_stopword_only_record_is_dropped() {
        let tf = TermFrequency::new(&ExtractionConfig::default());
        let out = tf.generate(
            &Expert::new("E1", "Expert One"),
            batch(&[(2019, "the and of"), (2020, "semantic parsing")]),
            &Locale::new("en"),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out.iter().next().unwrap().year(), Some(2020));
    }

    #[test]
    fn test_max_keywords_caps_each_record() {
        let config = ExtractionConfig {
            max_keywords: 2,
            ..ExtractionConfig::default()
        };
        let out = TermFrequency::new(&config).generate(
            &Expert::new("E1", "Expert One"),
            batch(&[(2019, "semantic parsing lexicon corpus syntax")]),
            &Locale::new("en"),
        );
        let record = out.iter().next().unwrap();
        assert_eq!(record.keywords(), &["corpus", "lexicon"]);
    }

    #[test]
    fn test_graph_selection_reweighted_by_frequency() {
        let config = ExtractionConfig {
            max_keywords: 2,
            ..ExtractionConfig::default()
        };
        let technique = TechniqueKind::GraphKeywordTermFrequency.build(&config);
        assert_eq!(technique.name(), "graph-keyword+term-frequency");

        let texts = [
            (2019, "kernels graph mining"),
            (2020, "graph kernels"),
            (2021, "kernels"),
        ];
        let graph = GraphKeyword::new(&config).generate(
            &Expert::new("E1", "Expert One"),
            batch(&texts),
            &Locale::new("en"),
        );
        let out = technique.generate(
            &Expert::new("E1", "Expert One"),
            batch(&texts),
            &Locale::new("en"),
        );
        assert_eq!(out.len(), graph.len());

        for year in [2019, 2020, 2021] {
            let selected: HashSet<&String> = by_year(&graph, year).keywords().iter().collect();
            let record = by_year(&out, year);
            let kept: HashSet<&String> = record.keywords().iter().collect();
            assert_eq!(kept, selected, "{}", year);
        }

        // kernels: 3 of 3, graph: 2 of 3.
        let second = by_year(&out, 2020);
        assert_eq!(second.keywords(), &["kernels", "graph"]);
        assert_eq!(second.weights(), &[1.0, 2.0 / 3.0]);
    }
}
