//! User API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{success, ApiResult};
use crate::models::{MemberId, PullRequestShort, SetIsActiveRequest, UserResponse};
use crate::AppState;

/// Pull requests a user is currently reviewing.
#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub user_id: MemberId,
    pub pull_requests: Vec<PullRequestShort>,
}

/// POST /users/setIsActive - Activate or deactivate a user.
pub async fn set_is_active(
    State(state): State<AppState>,
    Json(request): Json<SetIsActiveRequest>,
) -> ApiResult<UserResponse> {
    let id = MemberId::parse(&request.user_id)?;
    let member = state.repo.set_member_active(&id, request.is_active).await?;
    tracing::info!(user_id = %member.id, is_active = request.is_active, "member status changed");

    success(member.into())
}

/// GET /users/getReview/:user_id - List pull requests assigned to a user.
pub async fn get_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<UserReviewsResponse> {
    let id = MemberId::parse(&user_id)?;
    let pull_requests = state.repo.member_reviews(&id).await?;

    success(UserReviewsResponse {
        user_id: id,
        pull_requests,
    })
}
