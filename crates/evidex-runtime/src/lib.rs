//! Evidex Runtime: the pipeline that turns experts into refined evidence.
//!
//! Composes the entity directory, document retrieval, normalizer and one
//! extraction technique.

pub mod orchestrator;
pub mod types;

pub use orchestrator::EvidencePipeline;
pub use types::*;
