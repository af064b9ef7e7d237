//! Evidex Ingest: turns raw store records into evidence records.

pub mod normalize;

pub use normalize::{compose_text, render_retrieved, Normalizer};
