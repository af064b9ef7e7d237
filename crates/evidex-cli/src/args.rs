//! Command line of the `evidex` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use evidex_core::{Locale, TechniqueKind};

/// Expertise evidence extraction from a bibliographic store.
///
/// Configuration comes from $EVIDEX_CONFIG (default ./evidex.json), then
/// EVIDEX_* variables.
#[derive(Parser, Debug)]
#[command(name = "evidex", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all experts (JSON lines)
    Experts,
    /// Experts whose name matches a case-insensitive pattern
    Find {
        pattern: String,
    },
    /// Refined evidence for one expert (JSON)
    Collect(CollectArgs),
    /// Load authors and documents into the store
    Import {
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CollectArgs {
    pub expert_id: String,

    /// Extraction technique, e.g. term-frequency or graph-keyword+topics
    #[arg(short, long)]
    pub technique: Option<TechniqueKind>,

    /// Language hint, e.g. pt or en-US
    #[arg(short, long)]
    pub language: Option<Locale>,

    /// Source input name stamped on the evidence
    #[arg(short, long)]
    pub input: Option<String>,
}
