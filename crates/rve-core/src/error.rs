//! Error types for rve-core

use rve_io::IoError;
use rve_model::{Axis, ModelError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Fatal failures of a homogenization run.
///
/// Non-finite property values are not errors; they are carried through to the
/// report and filtered by label selection.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Opposite faces disagree after cleaning and sorting
    #[error("geometry mismatch on {axis} faces: {detail}")]
    GeometryMismatch { axis: Axis, detail: String },

    /// Loading discriminator is neither displacement nor tensor
    #[error("invalid loading kind: {0:?}")]
    InvalidLoadingKind(String),

    /// A direction code does not match `-?[1-3][1-3]`
    #[error("invalid loading direction {0:?}")]
    Dimension(String),

    /// Report request is inconsistent with the results
    #[error("report assembly failed: {0}")]
    ReportAssembly(String),

    /// The node table is empty, inconsistent or unreadable
    #[error("invalid mesh: {0}")]
    Mesh(String),

    /// The solver collaborator failed
    #[error("solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Model(ModelError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidLoadingKind(kind) => CoreError::InvalidLoadingKind(kind),
            ModelError::Dimension { code } => CoreError::Dimension(code),
            other => CoreError::Model(other),
        }
    }
}
