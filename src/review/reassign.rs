//! Transactional reviewer reassignment.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ReviewerSelector;
use crate::errors::AppError;
use crate::models::{
    MemberHistoryFact, MemberId, PullRequest, PullRequestId, ReassignmentRequest,
    ReassignmentResult,
};

/// Storage capable of opening a reassignment unit of work.
#[async_trait]
pub trait ReassignStore: Send + Sync {
    type Tx: ReassignTx;

    /// Open a new unit of work.
    async fn begin_reassign(&self) -> Result<Self::Tx, AppError>;
}

/// An open unit of work with exactly the operations a reassignment needs.
///
/// Nothing written through it is visible to other callers before `commit`.
/// Dropping it without calling `commit` must roll it back.
#[async_trait]
pub trait ReassignTx: Send {
    /// Roster of the pull request's team, annotated for this pull request.
    ///
    /// Fails with `NotFound` when the pull request is absent, `Conflict` when
    /// it is merged and `NoContent` when no usable roster exists.
    async fn load_history(&mut self, pr_id: &PullRequestId)
        -> Result<Vec<MemberHistoryFact>, AppError>;

    /// Replace the `old` reviewer link with `new` and bump the version.
    async fn assign_reviewer(
        &mut self,
        pr_id: &PullRequestId,
        old: &MemberId,
        new: &MemberId,
    ) -> Result<PullRequest, AppError>;

    async fn commit(self) -> Result<(), AppError>;

    async fn rollback(self) -> Result<(), AppError>;
}

/// Orchestrates one reassignment inside a single unit of work.
pub struct ReassignmentCoordinator<S> {
    store: S,
    selector: ReviewerSelector,
}

impl<S: ReassignStore> ReassignmentCoordinator<S> {
    pub fn new(store: S, selector: ReviewerSelector) -> Self {
        Self { store, selector }
    }

    /// Replace a reviewer using a freshly seeded random source.
    pub async fn reassign(
        &self,
        request: &ReassignmentRequest,
    ) -> Result<ReassignmentResult, AppError> {
        let mut rng = StdRng::from_entropy();
        self.reassign_with_rng(request, &mut rng).await
    }

    /// Replace a reviewer, drawing the rotation start from `rng`.
    ///
    /// Commits on success. On any failure after the unit of work is opened
    /// it is rolled back and the original error is returned, with a failed
    /// rollback folded into it. Cancelling the returned future drops the
    /// open unit of work, which rolls it back.
    pub async fn reassign_with_rng<R>(
        &self,
        request: &ReassignmentRequest,
        rng: &mut R,
    ) -> Result<ReassignmentResult, AppError>
    where
        R: Rng + Send,
    {
        let mut tx = self.store.begin_reassign().await.map_err(|e| {
            tracing::error!(pr_id = %request.pr_id, error = %e, "failed to begin reassignment");
            infrastructure("begin reassignment", e)
        })?;

        match self.run(&mut tx, request, rng).await {
            Ok(result) => {
                tx.commit()
                    .await
                    .map_err(|e| infrastructure("commit reassignment", e))?;

                tracing::info!(
                    pr_id = %request.pr_id,
                    old_reviewer_id = %request.old_reviewer_id,
                    new_reviewer_id = %result.new_reviewer_id,
                    version = result.pull_request.version,
                    "reviewer reassigned"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(pr_id = %request.pr_id, error = %err, "reassignment rolled back");
                match tx.rollback().await {
                    Ok(()) => Err(err),
                    Err(rollback) => {
                        tracing::error!(pr_id = %request.pr_id, error = %rollback, "rollback failed");
                        Err(err.with_rollback_failure(rollback))
                    }
                }
            }
        }
    }

    async fn run<R>(
        &self,
        tx: &mut S::Tx,
        request: &ReassignmentRequest,
        rng: &mut R,
    ) -> Result<ReassignmentResult, AppError>
    where
        R: Rng + Send,
    {
        let roster = tx
            .load_history(&request.pr_id)
            .await
            .map_err(|e| classify("load roster", e))?;

        if roster.is_empty() {
            return Err(AppError::NotFound(format!(
                "Pull request {} not found",
                request.pr_id
            )));
        }

        tracing::debug!(pr_id = %request.pr_id, candidates = roster.len(), "roster loaded");

        let new_reviewer_id = self.selector.select(&roster, rng)?;

        let pull_request = tx
            .assign_reviewer(&request.pr_id, &request.old_reviewer_id, &new_reviewer_id)
            .await
            .map_err(|e| classify("assign reviewer", e))?;

        Ok(ReassignmentResult {
            pull_request,
            new_reviewer_id,
        })
    }
}

/// Keep taxonomy kinds the store reports, treat anything else as internal.
fn classify(stage: &str, err: AppError) -> AppError {
    match err {
        AppError::NotFound(_)
        | AppError::NoContent(_)
        | AppError::Conflict(_)
        | AppError::NoEligibleCandidate => err,
        other => infrastructure(stage, other),
    }
}

fn infrastructure(stage: &str, err: AppError) -> AppError {
    match err {
        AppError::Internal(detail) => AppError::Internal(format!("{}: {}", stage, detail)),
        other => AppError::Internal(format!("{}: {}", stage, other)),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::models::{MemberRole, MemberStatus};
    use crate::review::fake::{fact, member_id, pr_id, FakeStore};
    use crate::review::{EligibilityPolicy, EligibilityRuleSet};

    fn coordinator(store: FakeStore) -> ReassignmentCoordinator<FakeStore> {
        let rules = EligibilityRuleSet::new(false, [MemberStatus::Active], [MemberRole::Default]);
        ReassignmentCoordinator::new(store, ReviewerSelector::new(EligibilityPolicy::new(rules)))
    }

    fn request(pr: &str, old: &str) -> ReassignmentRequest {
        ReassignmentRequest {
            pr_id: pr_id(pr),
            old_reviewer_id: member_id(old),
        }
    }

    #[tokio::test]
    async fn test_reassign_commits_new_reviewer() {
        let store = FakeStore::new();
        store.seed_pull_request("X", "AUTHOR", &["R1", "R2"]);
        store.seed_roster(
            "X",
            vec![
                fact("AUTHOR", MemberStatus::Active, MemberRole::Author, false, false),
                fact("R1", MemberStatus::Active, MemberRole::Default, true, true),
                fact("R2", MemberStatus::Active, MemberRole::Default, true, true),
                fact("FREE", MemberStatus::Active, MemberRole::Default, false, false),
            ],
        );

        let coordinator = coordinator(store.clone());
        let result = coordinator
            .reassign_with_rng(&request("X", "R1"), &mut StdRng::seed_from_u64(3))
            .await
            .unwrap();

        assert_eq!(result.new_reviewer_id, member_id("FREE"));
        assert!(result.pull_request.has_reviewer(&member_id("FREE")));
        assert!(!result.pull_request.has_reviewer(&member_id("R1")));
        assert_eq!(result.pull_request.version, 2);

        let stored = store.pull_request("X").unwrap();
        assert_eq!(stored, result.pull_request);
        assert_eq!(store.commits(), 1);
        assert_eq!(store.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_reassign_never_returns_author() {
        let store = FakeStore::new();
        store.seed_pull_request("X", "AUTHOR", &["R1"]);
        store.seed_roster(
            "X",
            vec![
                fact("AUTHOR", MemberStatus::Active, MemberRole::Author, false, false),
                fact("R1", MemberStatus::Active, MemberRole::Default, true, true),
                fact("FREE", MemberStatus::Active, MemberRole::Default, false, false),
            ],
        );
        let rules = EligibilityRuleSet::new(
            true,
            [MemberStatus::Active],
            [MemberRole::Default, MemberRole::Author],
        );
        let coordinator = ReassignmentCoordinator::new(
            store.clone(),
            ReviewerSelector::new(EligibilityPolicy::new(rules)),
        );

        for seed in 0..50 {
            let result = coordinator
                .reassign_with_rng(&request("X", "R1"), &mut StdRng::seed_from_u64(seed))
                .await;
            if let Ok(result) = result {
                assert_ne!(result.new_reviewer_id, result.pull_request.author_id);
                // Put R1 back so the next round replaces the same link.
                store.seed_pull_request("X", "AUTHOR", &["R1"]);
            }
        }
    }

    #[tokio::test]
    async fn test_not_found_rolls_back_without_writes() {
        let store = FakeStore::new();
        store.seed_pull_request("OTHER", "AUTHOR", &["R1"]);
        let before = store.pull_request("OTHER");

        let err = coordinator(store.clone())
            .reassign(&request("MISSING", "R1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.commits(), 0);
        assert_eq!(store.pull_request("OTHER"), before);
        assert!(store.pull_request("MISSING").is_none());
    }

    #[tokio::test]
    async fn test_no_content_is_propagated() {
        let store = FakeStore::new();
        store.seed_pull_request("X", "AUTHOR", &["R1"]);

        let err = coordinator(store.clone())
            .reassign(&request("X", "R1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoContent(_)));
        assert_eq!(store.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_no_candidate_rolls_back() {
        let store = FakeStore::new();
        store.seed_pull_request("X", "AUTHOR", &["R1"]);
        store.seed_roster(
            "X",
            vec![
                fact("AUTHOR", MemberStatus::Active, MemberRole::Author, false, false),
                fact("R1", MemberStatus::Active, MemberRole::Default, true, true),
                fact("AWAY", MemberStatus::Inactive, MemberRole::Default, false, false),
            ],
        );

        let err = coordinator(store.clone())
            .reassign(&request("X", "R1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NoEligibleCandidate));
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.pull_request("X").unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_unassigned_old_reviewer_is_conflict() {
        let store = FakeStore::new();
        store.seed_pull_request("X", "AUTHOR", &["R1"]);
        store.seed_roster(
            "X",
            vec![fact("FREE", MemberStatus::Active, MemberRole::Default, false, false)],
        );

        let err = coordinator(store.clone())
            .reassign(&request("X", "STRANGER"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.rollbacks(), 1);
        assert!(store.pull_request("X").unwrap().has_reviewer(&member_id("R1")));
    }

    #[tokio::test]
    async fn test_begin_failure_is_internal() {
        let store = FakeStore::new().failing_begin();

        let err = coordinator(store.clone())
            .reassign(&request("X", "R1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(store.rollbacks(), 0);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_merged_into_original_error() {
        let store = FakeStore::new().failing_rollback();

        let err = coordinator(store.clone())
            .reassign(&request("MISSING", "R1"))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(matches!(err.root(), AppError::NotFound(_)));
        assert!(err.to_string().contains("rollback refused"));
    }

    #[tokio::test]
    async fn test_cancellation_rolls_back() {
        let store = FakeStore::new().hanging_load();
        store.seed_pull_request("X", "AUTHOR", &["R1"]);
        let coordinator = coordinator(store.clone());

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), coordinator.reassign(&request("X", "R1")))
                .await;

        assert!(outcome.is_err());
        assert_eq!(store.rollbacks(), 1);
        assert_eq!(store.commits(), 0);
        assert_eq!(store.pull_request("X").unwrap().version, 1);
    }
}
