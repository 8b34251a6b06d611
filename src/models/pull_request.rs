//! Pull request model and the request/response bodies around it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Member, MemberId, PullRequestId};

/// Lifecycle status of a pull request. Only ever moves from open to merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }

    pub fn from_db(s: &str) -> Self {
        if s == "MERGED" {
            PrStatus::Merged
        } else {
            PrStatus::Open
        }
    }
}

/// A pull request with its currently assigned reviewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: PullRequestId,
    pub name: String,
    pub author_id: MemberId,
    pub status: PrStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly when `status` is `Merged`.
    pub merged_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency marker, bumped by every mutation.
    pub version: i64,
    pub reviewers: Vec<Member>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    pub fn has_reviewer(&self, id: &MemberId) -> bool {
        self.reviewers.iter().any(|m| &m.id == id)
    }
}

/// Abbreviated pull request used in review listings.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestShort {
    pub pull_request_id: PullRequestId,
    pub pull_request_name: String,
    pub author_id: MemberId,
    pub status: PrStatus,
}

/// Validated input for creating a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub id: PullRequestId,
    pub name: String,
    pub author_id: MemberId,
}

/// Which reviewer to replace on which pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignmentRequest {
    pub pr_id: PullRequestId,
    pub old_reviewer_id: MemberId,
}

/// Outcome of a successful reassignment.
#[derive(Debug, Clone)]
pub struct ReassignmentResult {
    pub pull_request: PullRequest,
    pub new_reviewer_id: MemberId,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// Request body for merging a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

/// Request body for replacing a reviewer.
#[derive(Debug, Clone, Deserialize)]
pub struct ReassignPullRequestRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

/// JSON shape of a pull request as exposed over REST.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestResponse {
    pub pull_request_id: PullRequestId,
    pub pull_request_name: String,
    pub author_id: MemberId,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<MemberId>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
    pub version: i64,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id,
            pull_request_name: pr.name,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.reviewers.into_iter().map(|m| m.id).collect(),
            created_at: pr.created_at.to_rfc3339(),
            merged_at: pr.merged_at.map(|t| t.to_rfc3339()),
            version: pr.version,
        }
    }
}

/// Response body for a reassignment.
#[derive(Debug, Clone, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequestResponse,
    pub replaced_by: MemberId,
}

impl From<ReassignmentResult> for ReassignResponse {
    fn from(result: ReassignmentResult) -> Self {
        Self {
            pr: result.pull_request.into(),
            replaced_by: result.new_reviewer_id,
        }
    }
}
