//! Expert identity.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A person being profiled.
///
/// Identity is the canonical id alone: two `Expert` values with the same id
/// are the same entity no matter what name or source mappings they carry, so
/// collecting experts into a `HashSet` collapses duplicate directory rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expert {
    id: String,
    name: String,
    #[serde(default)]
    source_identifiers: BTreeMap<String, String>,
}

impl Expert {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_identifiers: BTreeMap::new(),
        }
    }

    /// Register the identifier this expert has inside `source`.
    ///
    /// Only the directory layer calls this, while building the value it
    /// hands out.
    pub fn with_source_identifier(
        mut self,
        source: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        self.source_identifiers.insert(source.into(), id.into());
        self
    }

    /// Canonical, process-wide id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_identifiers(&self) -> &BTreeMap<String, String> {
        &self.source_identifiers
    }

    /// Id valid inside `source`, or the canonical id when unmapped.
    pub fn id_in_source(&self, source: &str) -> &str {
        self.source_identifiers
            .get(source)
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

impl PartialEq for Expert {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Expert {}

impl Hash for Expert {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Expert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
