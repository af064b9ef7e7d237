//! Shared preprocessing: token cleaning, per-language stopwords, and English
//! conflation of inflected forms.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use stop_words::{get, LANGUAGE};
use tracing::warn;

use crate::stemmer::stem_key;
use evidex_core::{EvidenceRecord, Language, Locale};

/// Stopword sets, built once per process.
static STOPWORDS: Lazy<HashMap<Language, HashSet<String>>> = Lazy::new(|| {
    Language::all()
        .iter()
        .map(|&lang| {
            let words = get(stop_words_language(lang))
                .into_iter()
                .map(|w| w.to_lowercase())
                .collect();
            (lang, words)
        })
        .collect()
});

fn stop_words_language(lang: Language) -> LANGUAGE {
    match lang {
        Language::English => LANGUAGE::English,
        Language::Portuguese => LANGUAGE::Portuguese,
        Language::Spanish => LANGUAGE::Spanish,
        Language::French => LANGUAGE::French,
        Language::German => LANGUAGE::German,
        Language::Italian => LANGUAGE::Italian,
    }
}

/// A raw record together with its cleaned terms, in text order.
#[derive(Debug, Clone)]
pub struct PreparedRecord {
    pub record: EvidenceRecord,
    pub terms: Vec<String>,
}

/// Tokenizer configured for one language hint.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    language: Option<Language>,
    min_token_len: usize,
}

impl Preprocessor {
    /// Resolve `locale`; an unsupported one degrades to language-agnostic
    /// processing (no stopwords, no conflation).
    pub fn for_locale(locale: &Locale, min_token_len: usize) -> Self {
        let language = match locale.language() {
            Ok(lang) => Some(lang),
            Err(e) => {
                warn!("{}, falling back to language-agnostic tokenization", e);
                None
            }
        };
        Self {
            language,
            min_token_len,
        }
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.language
            .and_then(|lang| STOPWORDS.get(&lang))
            .map(|set| set.contains(word))
            .unwrap_or(false)
    }

    /// Lowercase, trim punctuation, drop numbers, short tokens and stopwords.
    pub fn clean_tokens(&self, keywords: &[String]) -> Vec<String> {
        keywords
            .iter()
            .flat_map(|kw| kw.split(|c: char| c.is_whitespace() || c == '/'))
            .filter_map(|raw| {
                let token = raw
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase();
                if token.chars().count() < self.min_token_len {
                    return None;
                }
                if token.chars().all(|c| c.is_numeric()) {
                    return None;
                }
                if self.is_stopword(&token) {
                    return None;
                }
                Some(token)
            })
            .collect()
    }

    /// Clean every record of a batch and return them in a stable order.
    ///
    /// For English, inflected forms sharing a stem are rewritten to the most
    /// frequent surface form in the batch (ties go to the smallest string).
    pub fn prepare(&self, raw: HashSet<EvidenceRecord>) -> Vec<PreparedRecord> {
        let mut records: Vec<EvidenceRecord> = raw.into_iter().collect();
        records.sort_by(compare_records);

        let mut prepared: Vec<PreparedRecord> = records
            .into_iter()
            .map(|record| {
                let terms = self.clean_tokens(record.keywords());
                PreparedRecord { record, terms }
            })
            .collect();

        if self.language == Some(Language::English) {
            conflate(&mut prepared);
        }
        prepared
    }
}

fn conflate(prepared: &mut [PreparedRecord]) {
    let mut surface_counts: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for p in prepared.iter() {
        for term in &p.terms {
            *surface_counts
                .entry(stem_key(term))
                .or_default()
                .entry(term.clone())
                .or_insert(0) += 1;
        }
    }

    let representative: HashMap<String, String> = surface_counts
        .into_iter()
        .filter_map(|(key, forms)| {
            forms
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                .map(|(form, _)| (key, form))
        })
        .collect();

    for p in prepared.iter_mut() {
        for term in p.terms.iter_mut() {
            if let Some(rep) = representative.get(&stem_key(term)) {
                if rep != term {
                    *term = rep.clone();
                }
            }
        }
    }
}

/// Order by timestamp, then keywords, then input.
pub(crate) fn compare_records(a: &EvidenceRecord, b: &EvidenceRecord) -> Ordering {
    a.timestamp()
        .cmp(&b.timestamp())
        .then_with(|| a.keywords().cmp(b.keywords()))
        .then_with(|| a.input().as_str().cmp(b.input().as_str()))
}
