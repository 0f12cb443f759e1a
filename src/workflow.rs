//! Editorial workflow for section content
//!
//! Content moves through a fixed graph of publication states:
//!
//! ```text
//! draft --submit--> pending_review --approve--> approved --publish--> published --archive--> archived
//!                         |
//!                         +--reject--> rejected
//! ```
//!
//! `rejected` and `archived` are terminal. All checks happen here, before any
//! request is sent to the backend.

use crate::error::{CmsError, CmsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::PendingReview => "pending_review",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    /// No action leads out of this status
    pub fn is_terminal(&self) -> bool {
        allowed_actions(*self).is_empty()
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Approve,
    Reject,
    Publish,
    Archive,
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 5] = [
        WorkflowAction::Submit,
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::Publish,
        WorkflowAction::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Publish => "publish",
            WorkflowAction::Archive => "archive",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowAction::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CmsError::validation(format!("unknown workflow action '{s}'")))
    }
}

/// Target status for `action` taken from `from`, or `None` when the graph has no such edge
fn target(from: ContentStatus, action: WorkflowAction) -> Option<ContentStatus> {
    use ContentStatus::*;
    use WorkflowAction::*;

    match (from, action) {
        (Draft, Submit) => Some(PendingReview),
        (PendingReview, Approve) => Some(Approved),
        (PendingReview, Reject) => Some(Rejected),
        (Approved, Publish) => Some(Published),
        (Published, Archive) => Some(Archived),
        _ => None,
    }
}

/// Apply a workflow action to a status.
///
/// Pure; the caller persists the returned status and only adopts it locally
/// once the backend confirms.
pub fn apply(status: ContentStatus, action: WorkflowAction) -> CmsResult<ContentStatus> {
    target(status, action).ok_or(CmsError::InvalidTransition {
        from: status,
        action,
    })
}

pub fn can_apply(status: ContentStatus, action: WorkflowAction) -> bool {
    target(status, action).is_some()
}

/// Actions that are legal from `status`, in display order
pub fn allowed_actions(status: ContentStatus) -> Vec<WorkflowAction> {
    WorkflowAction::ALL
        .into_iter()
        .filter(|action| can_apply(status, *action))
        .collect()
}
