//! annostore - a directory-backed store for text documents and their
//! span annotations
//!
//! Documents carry immutable text, features and an ordered list of
//! labeled character spans. A schema registry validates annotation
//! features while authoring. The store persists a corpus destructively
//! and atomically, and reads it back lazily in the original order.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod observability;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
