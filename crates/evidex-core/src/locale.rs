//! Language hints passed to extraction techniques.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Languages with dedicated tokenization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Portuguese,
    Spanish,
    French,
    German,
    Italian,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Portuguese => "pt",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::German => "de",
            Self::Italian => "it",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Portuguese,
            Self::Spanish,
            Self::French,
            Self::German,
            Self::Italian,
        ]
    }
}

/// A locale code reduced to its primary language subtag (`"pt-BR"` → `pt`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(code: &str) -> Self {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        Self(primary)
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// The supported language for this locale.
    ///
    /// Fails with [`Error::UnsupportedLocale`]; callers are expected to fall
    /// back to language-agnostic processing.
    pub fn language(&self) -> Result<Language> {
        Language::all()
            .iter()
            .copied()
            .find(|l| l.code() == self.0)
            .ok_or_else(|| Error::UnsupportedLocale(self.0.clone()))
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("pt")
    }
}

impl From<Language> for Locale {
    fn from(language: Language) -> Self {
        Self(language.code().to_string())
    }
}

impl From<String> for Locale {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl std::str::FromStr for Locale {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
