//! Adapter contracts the pipeline consumes.
//!
//! Both traits are object safe and `Send + Sync` so one store value can serve
//! as directory and retrieval behind `Arc<dyn ...>` handles.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};

use crate::types::ExternalDocumentRecord;
use evidex_core::{Expert, Result};

/// Lazy sequence of raw documents produced by a retrieval adapter.
pub type Documents = Box<dyn Iterator<Item = ExternalDocumentRecord> + Send>;

/// Resolves external author records into experts.
pub trait EntityDirectory: Send + Sync {
    /// Every known expert. Rows sharing an id collapse into one expert.
    fn list_all(&self) -> Result<HashSet<Expert>>;

    /// Experts whose display name matches `pattern` case-insensitively.
    ///
    /// No match is an empty set, never an error.
    fn find_by_name(&self, pattern: &str) -> Result<HashSet<Expert>>;
}

/// Fetches the raw documents attributed to an expert.
pub trait DocumentRetrieval: Send + Sync {
    /// All documents whose author list contains the expert's id in this
    /// source. Order is unspecified.
    fn fetch_for(&self, expert: &Expert) -> Result<Documents>;
}

/// Case-insensitive display-name matcher built by [`name_matcher`].
#[derive(Debug, Clone)]
pub struct NameMatcher {
    regex: Option<Regex>,
}

impl NameMatcher {
    /// Whether `name` matches. A pattern that could not be compiled at all
    /// matches nothing.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(name))
    }
}

/// Case-insensitive name matcher.
///
/// `pattern` is a regex; one that does not compile is matched literally.
pub fn name_matcher(pattern: &str) -> NameMatcher {
    let build = |p: &str| RegexBuilder::new(p).case_insensitive(true).build();
    let regex = match build(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::debug!("Name pattern {:?} is not a regex ({}), matching literally", pattern, e);
            build(&regex::escape(pattern))
                .map_err(|e| tracing::warn!("Name pattern {:?} rejected: {}", pattern, e))
                .ok()
        }
    };
    NameMatcher { regex }
}
