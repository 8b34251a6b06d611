//! Team model.

use serde::{Deserialize, Serialize};

use super::{Member, MemberId, MemberStatus};

/// A named team and its roster.
#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub members: Vec<Member>,
}

/// A member entry inside a team request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberDto {
    pub user_id: String,
    pub username: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Request body for creating a team together with its members.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMemberDto>,
}

/// JSON shape of a team as exposed over REST.
#[derive(Debug, Clone, Serialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberDto>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.name,
            members: team
                .members
                .into_iter()
                .map(|m| TeamMemberDto {
                    user_id: m.id.to_string(),
                    username: m.name,
                    is_active: m.status.is_active(),
                })
                .collect(),
        }
    }
}

/// Validated member entry ready to be stored.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub id: MemberId,
    pub name: String,
    pub status: MemberStatus,
}
