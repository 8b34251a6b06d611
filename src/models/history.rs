//! Per-pull-request projection of team members as reassignment candidates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{MemberId, MemberStatus};

/// Role a member plays relative to one pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// No prior relation to the pull request, or a current reviewer.
    Default,
    /// Authored the pull request.
    Author,
    /// Was a reviewer on the pull request and has since been replaced.
    Reassigned,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Default => "default",
            MemberRole::Author => "author",
            MemberRole::Reassigned => "reassigned",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(MemberRole::Default),
            "author" | "pr-author" => Ok(MemberRole::Author),
            "reassigned" | "had-been-reassigned" => Ok(MemberRole::Reassigned),
            other => Err(format!("unknown member role {:?}", other)),
        }
    }
}

/// Read-only view of one team member as a candidate for one pull request.
///
/// Produced fresh by the store on every reassignment attempt and never
/// persisted itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHistoryFact {
    pub id: MemberId,
    pub status: MemberStatus,
    pub role: MemberRole,
    /// Ever linked as a reviewer to this pull request, per persisted history.
    pub was_assigned_before: bool,
    /// Linked as a reviewer right now.
    pub is_current_reviewer: bool,
}

impl MemberHistoryFact {
    /// Structural guard independent of configuration: the author and anyone
    /// already reviewing can never be picked as the replacement.
    pub fn can_take_over(&self) -> bool {
        self.role != MemberRole::Author && !self.is_current_reviewer
    }
}
