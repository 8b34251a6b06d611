//! Team member model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::MemberId;

/// Whether a member currently takes part in reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Inactive => "inactive",
        }
    }

    pub fn from_active(active: bool) -> Self {
        if active {
            MemberStatus::Active
        } else {
            MemberStatus::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MemberStatus::Active)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(MemberStatus::Active),
            "inactive" => Ok(MemberStatus::Inactive),
            other => Err(format!("unknown member status {:?}", other)),
        }
    }
}

/// A team member who can author or review pull requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub status: MemberStatus,
    /// Owning team, if the member has been linked to one.
    pub team: Option<String>,
}

/// JSON shape of a member as exposed over REST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: MemberId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub is_active: bool,
}

impl From<Member> for UserResponse {
    fn from(member: Member) -> Self {
        Self {
            user_id: member.id,
            username: member.name,
            team_name: member.team,
            is_active: member.status.is_active(),
        }
    }
}

/// Request body for activating or deactivating a member.
#[derive(Debug, Clone, Deserialize)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}
