//! Team API endpoints.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{require, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateTeamRequest, MemberId, MemberStatus, NewMember, TeamResponse};
use crate::AppState;

/// POST /team/add - Create a team with its members.
pub async fn create_team(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> ApiResult<TeamResponse> {
    require("team_name", &request.team_name)?;
    if request.members.is_empty() {
        return Err(AppError::Validation("members must not be empty".to_string()));
    }

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(request.members.len());
    for dto in &request.members {
        let id = MemberId::parse(&dto.user_id)?;
        require("username", &dto.username)?;
        if !seen.insert(id.clone()) {
            return Err(AppError::Validation(format!(
                "Member {} is listed more than once",
                id
            )));
        }
        members.push(NewMember {
            id,
            name: dto.username.trim().to_string(),
            status: MemberStatus::from_active(dto.is_active),
        });
    }

    let team = state
        .repo
        .create_team(request.team_name.trim(), &members)
        .await?;
    tracing::info!(team = %team.name, members = team.members.len(), "team created");

    success(team.into())
}

/// GET /team/get/:team_name - Get a team with its members.
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_name): Path<String>,
) -> ApiResult<TeamResponse> {
    let team = state.repo.get_team(&team_name).await?;
    success(team.into())
}
