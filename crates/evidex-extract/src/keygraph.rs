//! Graph-based keyword extraction: a term co-occurrence graph ranked by
//! weighted PageRank.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use evidex_core::{EvidenceRecord, Expert, ExtractionConfig, Locale};

use crate::technique::{rank_terms, ExtractionTechnique};
use crate::tokenize::{PreparedRecord, Preprocessor};

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-6;

/// Undirected co-occurrence graph over the terms of one batch.
///
/// Edge weight counts how often two distinct terms appear within `window`
/// positions of each other inside a record.
pub struct CooccurrenceGraph {
    graph: UnGraph<String, f64>,
    node_index: HashMap<String, NodeIndex>,
}

impl CooccurrenceGraph {
    pub fn build(records: &[PreparedRecord], window: usize) -> Self {
        let mut g = Self {
            graph: UnGraph::new_undirected(),
            node_index: HashMap::new(),
        };
        let window = window.max(1);

        for p in records {
            let nodes: Vec<NodeIndex> = p.terms.iter().map(|t| g.ensure_node(t)).collect();
            for (i, &a) in nodes.iter().enumerate() {
                for &b in nodes.iter().skip(i + 1).take(window) {
                    if a != b {
                        g.bump_edge(a, b);
                    }
                }
            }
        }
        g
    }

    fn ensure_node(&mut self, term: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(term) {
            return idx;
        }
        let idx = self.graph.add_node(term.to_string());
        self.node_index.insert(term.to_string(), idx);
        idx
    }

    fn bump_edge(&mut self, a: NodeIndex, b: NodeIndex) {
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                if let Some(w) = self.graph.edge_weight_mut(edge) {
                    *w += 1.0;
                }
            }
            None => {
                self.graph.add_edge(a, b, 1.0);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Weight of the edge between two terms, 0 when absent.
    pub fn edge_weight(&self, a: &str, b: &str) -> f64 {
        match (self.node_index.get(a), self.node_index.get(b)) {
            (Some(&x), Some(&y)) => self
                .graph
                .find_edge(x, y)
                .and_then(|e| self.graph.edge_weight(e))
                .copied()
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// PageRank score per term. Scores sum to 1; nodes without edges spread
    /// their mass uniformly.
    pub fn pagerank(&self) -> HashMap<String, f64> {
        let n = self.graph.node_count();
        if n == 0 {
            return HashMap::new();
        }
        let uniform = 1.0 / n as f64;

        let strength: Vec<f64> = self
            .graph
            .node_indices()
            .map(|v| self.graph.edges(v).map(|e| *e.weight()).sum())
            .collect();

        let mut scores = vec![uniform; n];
        for iteration in 0..MAX_ITERATIONS {
            let dangling: f64 = self
                .graph
                .node_indices()
                .filter(|v| strength[v.index()] == 0.0)
                .map(|v| scores[v.index()])
                .sum();
            let base = (1.0 - DAMPING) * uniform + DAMPING * dangling * uniform;

            let mut next = vec![base; n];
            for v in self.graph.node_indices() {
                let out = strength[v.index()];
                if out == 0.0 {
                    continue;
                }
                for e in self.graph.edges(v) {
                    let u = if e.source() == v { e.target() } else { e.source() };
                    next[u.index()] += DAMPING * scores[v.index()] * e.weight() / out;
                }
            }

            let delta: f64 = next
                .iter()
                .zip(&scores)
                .map(|(a, b)| (a - b).abs())
                .sum();
            scores = next;
            if delta < TOLERANCE {
                debug!("PageRank converged after {} iterations", iteration + 1);
                break;
            }
        }

        self.graph
            .node_indices()
            .map(|v| (self.graph[v].clone(), scores[v.index()]))
            .collect()
    }
}

/// Keeps each record's terms ordered by centrality in the batch graph,
/// weighted relative to the most central term.
#[derive(Debug, Clone)]
pub struct GraphKeyword {
    max_keywords: usize,
    min_token_len: usize,
    window: usize,
}

impl GraphKeyword {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_keywords: config.max_keywords,
            min_token_len: config.min_token_len,
            window: config.window,
        }
    }
}

impl ExtractionTechnique for GraphKeyword {
    fn name(&self) -> &str {
        "graph-keyword"
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
        let graph = CooccurrenceGraph::build(&prepared, self.window);
        let scores = graph.pagerank();
        let top = scores.values().copied().fold(0.0_f64, f64::max);
        if top <= 0.0 {
            debug!("Empty co-occurrence graph for {}", expert.id());
            return HashSet::new();
        }

        let out: HashSet<EvidenceRecord> = prepared
            .iter()
            .filter_map(|p| {
                let scored = p
                    .terms
                    .iter()
                    .map(|t| (t.clone(), scores.get(t).copied().unwrap_or(0.0) / top))
                    .collect();
                let (keywords, weights) = rank_terms(scored, self.max_keywords);
                if keywords.is_empty() {
                    return None;
                }
                Some(p.record.refine(keywords, weights))
            })
            .collect();

        debug!(
            "graph-keyword: {} nodes, {} edges, {} records for {}",
            graph.node_count(),
            graph.edge_count(),
            out.len(),
            expert.id()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::{year_start, SourceInputRef};
    use std::sync::Arc;

    fn prepared(texts: &[&str]) -> Vec<PreparedRecord> {
        let expert = Arc::new(Expert::new("E1", "Expert One"));
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let terms: Vec<String> = text.split_whitespace().map(str::to_string).collect();
                PreparedRecord {
                    record: EvidenceRecord::new(
                        Arc::clone(&expert),
                        terms.clone(),
                        year_start(Some(2000 + i as i32)),
                        SourceInputRef::new("lexr"),
                    ),
                    terms,
                }
            })
            .collect()
    }

    #[test]
    fn test_window_limits_edges() {
        let g = CooccurrenceGraph::build(&prepared(&["aaa bbb ccc ddd"]), 2);
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_weight("aaa", "bbb"), 1.0);
        assert_eq!(g.edge_weight("aaa", "ccc"), 1.0);
        assert_eq!(g.edge_weight("aaa", "ddd"), 0.0);
        assert_eq!(g.edge_count(), 5);
    }

    #[test]
    fn test_repeated_pairs_accumulate() {
        let g = CooccurrenceGraph::build(&prepared(&["aaa bbb", "bbb aaa"]), 1);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edge_weight("bbb", "aaa"), 2.0);
    }

    #[test]
    fn test_hub_ranks_first() {
        let g = CooccurrenceGraph::build(
            &prepared(&["hub one", "hub two", "hub three", "hub four"]),
            1,
        );
        let scores = g.pagerank();
        let hub = scores["hub"];
        for leaf in ["one", "two", "three", "four"] {
            assert!(hub > scores[leaf]);
        }
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_generate_orders_by_centrality() {
        let expert = Arc::new(Expert::new("E1", "Expert One"));
        let raw: HashSet<EvidenceRecord> = [
            "ontology alignment ontology matching",
            "ontology reasoning",
            "ontology learning alignment",
        ]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            EvidenceRecord::new(
                Arc::clone(&expert),
                text.split_whitespace().map(str::to_string).collect(),
                year_start(Some(2010 + i as i32)),
                SourceInputRef::new("lexr"),
            )
        })
        .collect();

        let out = GraphKeyword::new(&ExtractionConfig::default()).generate(
            &expert,
            raw,
            &Locale::new("en"),
        );
        assert_eq!(out.len(), 3);
        for record in &out {
            assert_eq!(record.keywords()[0], "ontology");
            assert_eq!(record.weights()[0], 1.0);
            assert!(record.weights().windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
