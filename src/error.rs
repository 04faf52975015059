//! Crate-level error for callers that mix subsystems

use thiserror::Error;

use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::schema::SchemaError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Stable code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Document(e) => e.code(),
            Error::Schema(e) => e.code().code(),
            Error::Store(e) => e.code().code(),
            Error::Config(e) => e.code(),
        }
    }
}
