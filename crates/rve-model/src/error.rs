//! Error types for rve-model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid loading kind: {0:?} (expected \"displacement\" or \"tensor\")")]
    InvalidLoadingKind(String),

    #[error("invalid loading direction {code:?}: must match -?[1-3][1-3]")]
    Dimension { code: String },

    #[error("missing required field `{field}` in {context}")]
    MissingField { field: &'static str, context: String },

    #[error("unknown property label: {0:?}")]
    UnknownProperty(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("parameter check failed: {0}")]
    Validation(String),
}
