//! CLI argument definitions using clap
//!
//! Commands:
//! - annostore build --input <docs.json> --store <dir> [--config <path>] [--schema <file|name>]...
//! - annostore dump --store <dir>
//! - annostore validate --store <dir>
//! - annostore info --store <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// annostore - a directory-backed store for annotated text documents
#[derive(Parser, Debug)]
#[command(name = "annostore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build (or rebuild) a store from a JSON array of documents
    Build {
        /// JSON file holding the documents to store
        #[arg(long)]
        input: PathBuf,

        /// Store directory; replaced if it exists
        #[arg(long)]
        store: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Schema file or bundled schema name, in addition to the config
        #[arg(long = "schema")]
        schemas: Vec<String>,
    },

    /// Print every stored document as one JSON line
    Dump {
        /// Store directory
        #[arg(long)]
        store: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate stored documents against stored schemas
    Validate {
        /// Store directory
        #[arg(long)]
        store: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print corpus name, document count and schemas
    Info {
        /// Store directory
        #[arg(long)]
        store: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_collects_repeated_schemas() {
        let cli = Cli::parse_from([
            "annostore", "build", "--input", "docs.json", "--store", "out",
            "--schema", "Person", "--schema", "event.json",
        ]);
        match cli.command {
            Command::Build { schemas, config, .. } => {
                assert_eq!(schemas, vec!["Person", "event.json"]);
                assert!(config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_store_is_required() {
        assert!(Cli::try_parse_from(["annostore", "dump"]).is_err());
    }
}
