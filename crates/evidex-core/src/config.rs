//! Configuration: store connection target, source identity, extraction tuning.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::locale::Locale;

/// Connection target of the external document store.
///
/// Read once, when a connection is established. The embedded SQLite backend
/// treats `database` as the database file path; `host`/`port` name remote
/// deployments and show up in logs and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    27017
}
fn default_database() -> String {
    "lexr.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
        }
    }
}

impl StoreConfig {
    /// `host:port/database`, for log lines and error messages.
    pub fn describe(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Extraction techniques selectable at pipeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TechniqueKind {
    #[serde(rename = "term-frequency")]
    TermFrequency,
    #[serde(rename = "term-frequency+topics")]
    TermFrequencyTopics,
    #[serde(rename = "graph-keyword")]
    GraphKeyword,
    #[serde(rename = "graph-keyword+topics")]
    GraphKeywordTopics,
    /// Graph-keyword selection, re-weighted by batch term frequency.
    #[serde(rename = "graph-keyword+term-frequency")]
    GraphKeywordTermFrequency,
    /// Topic clustering over the raw tokens, without re-weighting.
    #[serde(rename = "topics")]
    Topics,
}

impl TechniqueKind {
    pub fn all() -> &'static [TechniqueKind] {
        &[
            Self::TermFrequency,
            Self::TermFrequencyTopics,
            Self::GraphKeyword,
            Self::GraphKeywordTopics,
            Self::GraphKeywordTermFrequency,
            Self::Topics,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TermFrequency => "term-frequency",
            Self::TermFrequencyTopics => "term-frequency+topics",
            Self::GraphKeyword => "graph-keyword",
            Self::GraphKeywordTopics => "graph-keyword+topics",
            Self::GraphKeywordTermFrequency => "graph-keyword+term-frequency",
            Self::Topics => "topics",
        }
    }
}

impl std::fmt::Display for TechniqueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TechniqueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| Error::InvalidTechnique(s.to_string()))
    }
}

/// Tuning knobs shared by the extraction techniques.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Keep at most this many keywords per record (0 = unlimited).
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// Tokens shorter than this (in chars) are dropped.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Co-occurrence window for the graph technique, in tokens.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Number of latent topics for the topic-model techniques.
    #[serde(default = "default_topics")]
    pub topics: usize,
}

fn default_max_keywords() -> usize {
    10
}
fn default_min_token_len() -> usize {
    3
}
fn default_window() -> usize {
    2
}
fn default_topics() -> usize {
    5
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            min_token_len: default_min_token_len(),
            window: default_window(),
            topics: default_topics(),
        }
    }
}

/// Top-level Evidex configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidexConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Name of the evidence source; keys `Expert::source_identifiers`.
    #[serde(default = "default_source")]
    pub source: String,
    /// Label written into every record's provenance.
    #[serde(default = "default_source_label")]
    pub source_label: String,
    /// Language hint handed to the extraction technique.
    #[serde(default)]
    pub language: Locale,
    #[serde(default = "default_technique")]
    pub technique: TechniqueKind,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_source() -> String {
    "lexr".into()
}
fn default_source_label() -> String {
    "LexR record".into()
}
fn default_technique() -> TechniqueKind {
    TechniqueKind::TermFrequency
}

impl Default for EvidexConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            source: default_source(),
            source_label: default_source_label(),
            language: Locale::default(),
            technique: default_technique(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl EvidexConfig {
    /// Load config from an optional JSON file, then apply env overrides.
    ///
    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                let config: EvidexConfig = serde_json::from_str(&raw)?;
                info!("Loaded config from {}", path.display());
                config
            }
            _ => EvidexConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `EVIDEX_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("EVIDEX_DB_HOST") {
            self.store.host = host;
        }
        if let Some(port) = lookup("EVIDEX_DB_PORT") {
            self.store.port = port
                .parse()
                .map_err(|_| Error::Config(format!("EVIDEX_DB_PORT is not a port: {}", port)))?;
        }
        if let Some(database) = lookup("EVIDEX_DB_DATABASE") {
            self.store.database = database;
        }
        if let Some(source) = lookup("EVIDEX_SOURCE") {
            self.source = source;
        }
        if let Some(language) = lookup("EVIDEX_LANGUAGE") {
            self.language = Locale::new(&language);
        }
        if let Some(technique) = lookup("EVIDEX_TECHNIQUE") {
            self.technique = technique.parse()?;
        }
        Ok(())
    }
}
