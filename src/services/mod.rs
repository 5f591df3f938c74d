//! Enrollment workflow engine: eligibility, enrollment, grading and reporting
//! over the [`store::Store`] collaborator.

pub(crate) mod eligibility;
pub(crate) mod enrollment;
pub(crate) mod grading;
pub(crate) mod reporting;
pub(crate) mod store;

use thiserror::Error;

use crate::services::store::StoreError;

/// A problem with one item of a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ItemError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
}

impl ItemError {
    pub(crate) fn message(&self) -> &str {
        match self {
            Self::NotFound(message) | Self::Validation(message) | Self::Conflict(message) => {
                message
            }
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum WorkflowError {
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    /// At least one item failed; nothing of the batch was written.
    #[error("batch rejected")]
    Rejected(Vec<ItemError>),
    #[error(transparent)]
    Store(#[from] StoreError),
}
