//! CLI module for annostore
//!
//! Provides command-line interface for:
//! - build: Validate input documents and rebuild a store from them
//! - dump: Print stored documents as JSON lines
//! - validate: Check stored documents against stored schemas
//! - info: Print a store summary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build, dump, info, run, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{document_json, read_documents, InputAnnotation, InputDocument};
