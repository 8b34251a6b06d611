//! Pull request creation and the open to merged transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{NewPullRequest, PullRequest, PullRequestId};

/// Storage operations backing the pull request lifecycle.
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Insert an open pull request and assign its initial reviewers.
    ///
    /// Fails with `Duplicate` when the id is taken and `NotFound` when the
    /// author is unknown.
    async fn create_pull_request(&self, new: &NewPullRequest) -> Result<PullRequest, AppError>;

    async fn get_pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, AppError>;

    /// Flip an open pull request to merged, stamping `merged_at` and bumping
    /// the version. A pull request that is already merged is returned as is.
    async fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, AppError>;
}

pub struct PullRequestLifecycle<S> {
    store: S,
}

impl<S: PullRequestStore> PullRequestLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: &NewPullRequest) -> Result<PullRequest, AppError> {
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("pull_request_name is required".to_string()));
        }

        let pr = self.store.create_pull_request(new).await?;
        tracing::info!(
            pr_id = %pr.id,
            author_id = %pr.author_id,
            reviewers = pr.reviewers.len(),
            "pull request created"
        );
        Ok(pr)
    }

    /// Merge a pull request. Repeating the call returns the merged record
    /// unchanged.
    pub async fn merge(&self, id: &PullRequestId) -> Result<PullRequest, AppError> {
        let current = self
            .store
            .get_pull_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", id)))?;

        if current.is_merged() {
            tracing::debug!(pr_id = %id, "pull request already merged");
            return Ok(current);
        }

        let merged = self.store.mark_merged(id, Utc::now()).await?;
        tracing::info!(pr_id = %id, version = merged.version, "pull request merged");
        Ok(merged)
    }
}
