//! Evidex Extract: extraction techniques that refine raw evidence into
//! weighted, language-aware evidence.

pub mod keygraph;
pub mod stemmer;
pub mod technique;
pub mod term_frequency;
pub mod tokenize;
pub mod topics;

pub use keygraph::{CooccurrenceGraph, GraphKeyword};
pub use technique::{BuildTechnique, ExtractionTechnique};
pub use term_frequency::{FrequencyReweighted, TermFrequency};
pub use tokenize::{PreparedRecord, Preprocessor};
pub use topics::{RawTerms, TopicModel, TopicModeled};
