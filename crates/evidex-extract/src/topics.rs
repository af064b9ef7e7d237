//! Topic modeling over refined evidence.
//!
//! Seed-and-assign clustering: the `k` most frequent terms that do not
//! co-occur with an earlier seed become topic seeds, every other term joins
//! the seed it co-occurs with most, and a record's topic is the one its
//! (weighted) terms vote for.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use evidex_core::{EvidenceRecord, Expert, ExtractionConfig, Locale};

use crate::technique::ExtractionTechnique;
use crate::tokenize::{compare_records, Preprocessor};

/// A fitted topic model: seed terms and the topic of every known term.
#[derive(Debug, Clone, Default)]
pub struct TopicModel {
    seeds: Vec<String>,
    term_topic: HashMap<String, usize>,
}

impl TopicModel {
    /// Fit at most `k` topics (at least one) over term lists.
    pub fn fit(docs: &[Vec<String>], k: usize) -> Self {
        let k = k.max(1);

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        let mut cooc: HashMap<(&str, &str), usize> = HashMap::new();
        for doc in docs {
            let distinct: Vec<&str> = {
                let mut d: Vec<&str> = doc.iter().map(String::as_str).collect();
                d.sort_unstable();
                d.dedup();
                d
            };
            for (i, &a) in distinct.iter().enumerate() {
                *doc_freq.entry(a).or_insert(0) += 1;
                for &b in &distinct[i + 1..] {
                    *cooc.entry((a, b)).or_insert(0) += 1;
                }
            }
        }

        // Most frequent first; BTreeMap iteration breaks ties alphabetically.
        let mut by_freq: Vec<(&str, usize)> = doc_freq.iter().map(|(t, n)| (*t, *n)).collect();
        by_freq.sort_by(|a, b| b.1.cmp(&a.1));

        let mut seeds: Vec<&str> = Vec::new();
        for &(term, _) in &by_freq {
            if seeds.len() == k {
                break;
            }
            if seeds.iter().all(|s| together(&cooc, s, term) == 0) {
                seeds.push(term);
            }
        }
        // Too few separable terms: fill up with the next most frequent.
        for &(term, _) in &by_freq {
            if seeds.len() == k {
                break;
            }
            if !seeds.contains(&term) {
                seeds.push(term);
            }
        }

        let mut term_topic = HashMap::new();
        for &(term, _) in &by_freq {
            let topic = match seeds.iter().position(|s| *s == term) {
                Some(idx) => Some(idx),
                None => seeds
                    .iter()
                    .enumerate()
                    .map(|(idx, s)| (idx, together(&cooc, s, term)))
                    .filter(|(_, n)| *n > 0)
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                    .map(|(idx, _)| idx),
            };
            if let Some(topic) = topic {
                term_topic.insert(term.to_string(), topic);
            }
        }

        Self {
            seeds: seeds.into_iter().map(str::to_string).collect(),
            term_topic,
        }
    }

    pub fn topic_count(&self) -> usize {
        self.seeds.len()
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn topic_of(&self, term: &str) -> Option<usize> {
        self.term_topic.get(term).copied()
    }

    /// Dominant topic of a weighted term list. Terms without a topic do not
    /// vote; a term past the end of `weights` votes 1.0. With no votes at
    /// all the record falls into topic 0.
    pub fn dominant(&self, terms: &[String], weights: &[f64]) -> usize {
        let mut votes: BTreeMap<usize, f64> = BTreeMap::new();
        for (i, term) in terms.iter().enumerate() {
            if let Some(topic) = self.topic_of(term) {
                let w = weights.get(i).copied().unwrap_or(1.0);
                *votes.entry(topic).or_insert(0.0) += w;
            }
        }
        votes
            .into_iter()
            .fold(None, |best: Option<(usize, f64)>, (topic, score)| match best {
                Some((_, top)) if top >= score => best,
                _ => Some((topic, score)),
            })
            .map(|(topic, _)| topic)
            .unwrap_or(0)
    }
}

/// Number of documents containing both terms.
fn together<'a>(cooc: &HashMap<(&'a str, &'a str), usize>, a: &'a str, b: &'a str) -> usize {
    let key = if a <= b { (a, b) } else { (b, a) };
    cooc.get(&key).copied().unwrap_or(0)
}

/// Wraps another technique and tags its output with dominant topics.
pub struct TopicModeled {
    name: String,
    inner: Box<dyn ExtractionTechnique>,
    topics: usize,
}

impl TopicModeled {
    pub fn new(name: impl Into<String>, inner: Box<dyn ExtractionTechnique>, topics: usize) -> Self {
        Self {
            name: name.into(),
            inner,
            topics,
        }
    }
}

impl ExtractionTechnique for TopicModeled {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(
        &self,
        expert: &Expert,
        raw: HashSet<EvidenceRecord>,
        language: &Locale,
    ) -> HashSet<EvidenceRecord> {
        let mut refined: Vec<EvidenceRecord> =
            self.inner.generate(expert, raw, language).into_iter().collect();
        if refined.is_empty() {
            return HashSet::new();
        }
        refined.sort_by(compare_records);

        let docs: Vec<Vec<String>> = refined.iter().map(|r| r.keywords().to_vec()).collect();
        let model = TopicModel::fit(&docs, self.topics);
        debug!(
            "{}: {} topics over {} records for {}",
            self.name,
            model.topic_count(),
            refined.len(),
            expert.id()
        );

        refined
            .into_iter()
            .map(|r| {
                let topic = model.dominant(r.keywords(), r.weights());
                r.with_topic(topic)
            })
            .collect()
    }
}

/// Cleaned distinct terms in text order, unweighted. The inner step of the
/// standalone topic-model technique.
#[derive(Debug, Clone)]
pub struct RawTerms {
    max_keywords: usize,
    min_token_len: usize,
}

impl RawTerms {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_keywords: config.max_keywords,
            min_token_len: config.min_token_len,
        }
    }
}

impl ExtractionTechnique for RawTerms {
    fn name(&self) -> &str {
        "raw-terms"
    }

    fn generate(
        &self,
        _expert: &Expert,
        raw: HashSet<EvidenceRecord>,
        language: &Locale,
    ) -> HashSet<EvidenceRecord> {
        Preprocessor::for_locale(language, self.min_token_len)
            .prepare(raw)
            .into_iter()
            .filter_map(|p| {
                let mut seen = HashSet::new();
                let mut keywords: Vec<String> = p
                    .terms
                    .into_iter()
                    .filter(|t| seen.insert(t.clone()))
                    .collect();
                if self.max_keywords > 0 {
                    keywords.truncate(self.max_keywords);
                }
                if keywords.is_empty() {
                    return None;
                }
                let weights = vec![1.0; keywords.len()];
                Some(p.record.refine(keywords, weights))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::{year_start, SourceInputRef, TechniqueKind};
    use std::sync::Arc;

    use crate::technique::BuildTechnique;

    fn docs(texts: &[&str]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn raw(texts: &[&str]) -> HashSet<EvidenceRecord> {
        let expert = Arc::new(Expert::new("E1", "Expert One"));
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                EvidenceRecord::new(
                    Arc::clone(&expert),
                    text.split_whitespace().map(str::to_string).collect(),
                    year_start(Some(2000 + i as i32)),
                    SourceInputRef::new("lexr"),
                )
            })
            .collect()
    }

    #[test]
    fn test_disjoint_vocabularies_get_separate_topics() {
        let model = TopicModel::fit(
            &docs(&[
                "graph mining graph",
                "graph clustering",
                "protein folding",
                "protein structure",
            ]),
            2,
        );
        assert_eq!(model.topic_count(), 2);
        assert_eq!(model.seeds(), &["graph", "protein"]);
        assert_eq!(model.topic_of("clustering"), model.topic_of("graph"));
        assert_eq!(model.topic_of("folding"), model.topic_of("protein"));
        assert_ne!(model.topic_of("graph"), model.topic_of("protein"));
    }

    #[test]
    fn test_k_larger_than_vocabulary() {
        let model = TopicModel::fit(&docs(&["alpha beta"]), 5);
        assert_eq!(model.topic_count(), 2);
        assert!(TopicModel::fit(&[], 3).seeds().is_empty());
    }

    #[test]
    fn test_dominant_topic_follows_weights() {
        let model = TopicModel::fit(&docs(&["graph mining", "protein folding"]), 2);
        let terms = vec!["mining".to_string(), "protein".to_string()];
        let graph_topic = model.topic_of("graph").unwrap();
        let protein_topic = model.topic_of("protein").unwrap();
        assert_eq!(model.dominant(&terms, &[0.9, 0.1]), graph_topic);
        assert_eq!(model.dominant(&terms, &[0.1, 0.9]), protein_topic);
        assert_eq!(model.dominant(&["unknown".to_string()], &[]), 0);
    }

    #[test]
    fn test_zero_weight_does_not_outvote() {
        let model = TopicModel::fit(&docs(&["graph mining", "protein folding"]), 2);
        let terms = vec!["mining".to_string(), "protein".to_string()];
        let protein_topic = model.topic_of("protein").unwrap();
        assert_eq!(model.dominant(&terms, &[0.0, 0.5]), protein_topic);
        // Missing weights count as 1.0.
        assert_eq!(model.dominant(&terms, &[0.0]), protein_topic);
    }

    #[test]
    fn test_topic_techniques_tag_every_record() {
        let config = ExtractionConfig {
            topics: 2,
            ..ExtractionConfig::default()
        };
        let expert = Expert::new("E1", "Expert One");
        let batch = raw(&[
            "graph mining kernels",
            "graph clustering kernels",
            "protein folding dynamics",
            "protein docking dynamics",
        ]);

        for kind in [
            TechniqueKind::TermFrequencyTopics,
            TechniqueKind::GraphKeywordTopics,
            TechniqueKind::Topics,
        ] {
            let out = kind.build(&config).generate(&expert, batch.clone(), &Locale::new("en"));
            assert_eq!(out.len(), 4, "{}", kind);
            let topic_of = |word: &str| {
                out.iter()
                    .find(|r| r.keywords().iter().any(|k| k == word))
                    .and_then(|r| r.topic())
            };
            assert!(out.iter().all(|r| r.topic().is_some()));
            assert_eq!(topic_of("mining"), topic_of("clustering"), "{}", kind);
            assert_eq!(topic_of("folding"), topic_of("docking"), "{}", kind);
            assert_ne!(topic_of("mining"), topic_of("folding"), "{}", kind);
        }
    }

    #[test]
    fn test_raw_terms_keep_text_order() {
        let out = RawTerms::new(&ExtractionConfig::default()).generate(
            &Expert::new("E1", "Expert One"),
            raw(&["Protein folding and protein docking"]),
            &Locale::new("en"),
        );
        let record = out.iter().next().unwrap();
        assert_eq!(record.keywords(), &["protein", "folding", "docking"]);
        assert_eq!(record.weights(), &[1.0, 1.0, 1.0]);
    }
}
