//! Error taxonomy for the REST collaborator services
//!
//! Callers must distinguish 404 from other upstream failures: a missing
//! resource maps to an empty state in the UI while 500-class responses
//! surface as an error banner. `ServiceError` keeps that distinction
//! explicit at the type level.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resource not found")]
    NotFound,

    #[error("upstream service returned {status}")]
    Upstream {
        status: u16,
        detail: Option<String>,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

impl ServiceError {
    /// True when the caller should render an empty state rather than an
    /// error banner
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
