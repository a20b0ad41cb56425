use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pull_request: PullRequest,
}

/// Pull request webhook actions. Anything GitHub adds later lands in
/// `Unhandled` instead of failing the payload parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Closed,
    Reopened,
    Edited,
    Labeled,
    Unlabeled,
    Synchronize,
    Assigned,
    Unassigned,
    ReviewRequested,
    ReviewRequestRemoved,
    ReadyForReview,
    ConvertedToDraft,
    #[serde(other)]
    Unhandled,
}

impl fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PullRequestAction::Opened => "opened",
            PullRequestAction::Closed => "closed",
            PullRequestAction::Reopened => "reopened",
            PullRequestAction::Edited => "edited",
            PullRequestAction::Labeled => "labeled",
            PullRequestAction::Unlabeled => "unlabeled",
            PullRequestAction::Synchronize => "synchronize",
            PullRequestAction::Assigned => "assigned",
            PullRequestAction::Unassigned => "unassigned",
            PullRequestAction::ReviewRequested => "review_requested",
            PullRequestAction::ReviewRequestRemoved => "review_request_removed",
            PullRequestAction::ReadyForReview => "ready_for_review",
            PullRequestAction::ConvertedToDraft => "converted_to_draft",
            PullRequestAction::Unhandled => "unhandled",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub merged: bool,
    pub head: CommitRef,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

impl PullRequest {
    pub fn head_sha(&self) -> &str {
        &self.head.sha
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: String,
    pub html_url: String,
}
