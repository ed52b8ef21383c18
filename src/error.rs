//src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid taxid '{0}'")]
    InvalidTaxid(String),

    #[error("listing failed validation with {errors} error(s)")]
    Invalid { errors: usize },

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LineageError>;
