//! Rotating reviewer selection.

use rand::Rng;

use super::EligibilityPolicy;
use crate::errors::AppError;
use crate::models::{MemberHistoryFact, MemberId};

/// Picks a replacement reviewer from a pull request's roster.
///
/// The scan starts at a uniformly random index and walks the roster
/// circularly, returning the first candidate that passes both the structural
/// guard (not the author, not already reviewing) and the eligibility policy.
#[derive(Debug, Clone)]
pub struct ReviewerSelector {
    policy: EligibilityPolicy,
}

impl ReviewerSelector {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    /// Select a reviewer, drawing the starting index from `rng`.
    pub fn select<R>(&self, candidates: &[MemberHistoryFact], rng: &mut R) -> Result<MemberId, AppError>
    where
        R: Rng + ?Sized,
    {
        let len = candidates.len();
        if len == 0 {
            return Err(AppError::NoEligibleCandidate);
        }

        let start = rng.gen_range(0..len);

        (0..len)
            .map(|i| &candidates[(start + i) % len])
            .find(|candidate| candidate.can_take_over() && self.policy.is_eligible(candidate))
            .map(|candidate| candidate.id.clone())
            .ok_or(AppError::NoEligibleCandidate)
    }
}
