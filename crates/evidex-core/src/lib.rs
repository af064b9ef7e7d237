//! Evidex Core: expert/evidence data model, errors, configuration.

pub mod config;
pub mod error;
pub mod evidence;
pub mod expert;
pub mod locale;

pub use config::{EvidexConfig, ExtractionConfig, StoreConfig, TechniqueKind};
pub use error::{Error, Result};
pub use evidence::{year_start, EvidenceRecord, Provenance, SourceInputRef};
pub use expert::Expert;
pub use locale::{Language, Locale};
