//! Pull request API endpoints.

use axum::{extract::State, Json};

use super::{require, success, ApiResult};
use crate::models::{
    CreatePullRequestRequest, MemberId, MergePullRequestRequest, NewPullRequest,
    PullRequestId, PullRequestResponse, ReassignPullRequestRequest, ReassignResponse,
    ReassignmentRequest,
};
use crate::AppState;

/// POST /pullRequest/create - Open a pull request and assign reviewers.
pub async fn create_pull_request(
    State(state): State<AppState>,
    Json(request): Json<CreatePullRequestRequest>,
) -> ApiResult<PullRequestResponse> {
    require("pull_request_name", &request.pull_request_name)?;

    let new = NewPullRequest {
        id: PullRequestId::parse(&request.pull_request_id)?,
        name: request.pull_request_name.trim().to_string(),
        author_id: MemberId::parse(&request.author_id)?,
    };

    let pr = state.lifecycle.create(&new).await?;
    success(pr.into())
}

/// POST /pullRequest/merge - Merge a pull request. Safe to repeat.
pub async fn merge_pull_request(
    State(state): State<AppState>,
    Json(request): Json<MergePullRequestRequest>,
) -> ApiResult<PullRequestResponse> {
    let id = PullRequestId::parse(&request.pull_request_id)?;
    let pr = state.lifecycle.merge(&id).await?;
    success(pr.into())
}

/// POST /pullRequest/reassign - Replace one reviewer with an eligible teammate.
pub async fn reassign_reviewer(
    State(state): State<AppState>,
    Json(request): Json<ReassignPullRequestRequest>,
) -> ApiResult<ReassignResponse> {
    let request = ReassignmentRequest {
        pr_id: PullRequestId::parse(&request.pull_request_id)?,
        old_reviewer_id: MemberId::parse(&request.old_reviewer_id)?,
    };

    let result = state.reassigner.reassign(&request).await?;
    success(result.into())
}
