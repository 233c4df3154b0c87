//! Error types for rve-io

use std::path::PathBuf;

use rve_model::ModelError;
use thiserror::Error;

use crate::inp::ParseError;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Parse error in {}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid test case {}: {source}", path.display())]
    TestCase {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
