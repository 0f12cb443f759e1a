//! Error taxonomy shared by the store, the coordinators and the repository

use crate::workflow::{ContentStatus, WorkflowAction};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CmsError {
    /// A required field was missing or malformed. Raised before any request is sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transport failure, non-2xx status, or a `success: false` envelope
    #[error("request failed{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Network {
        status: Option<u16>,
        message: String,
    },

    #[error("cannot {action} content that is {from}")]
    InvalidTransition {
        from: ContentStatus,
        action: WorkflowAction,
    },

    /// The reorder was shown optimistically but the server rejected it.
    /// The canonical order is being reloaded.
    #[error("reorder was not saved: {0}")]
    Conflict(String),
}

impl CmsError {
    pub fn validation(message: impl Into<String>) -> Self {
        CmsError::Validation(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        CmsError::Network {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, CmsError::Network { .. })
    }
}

impl From<reqwest::Error> for CmsError {
    fn from(err: reqwest::Error) -> Self {
        CmsError::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type CmsResult<T> = std::result::Result<T, CmsError>;
