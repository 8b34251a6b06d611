//! Configurable eligibility rules for replacement reviewers.

use std::collections::HashSet;

use crate::models::{MemberHistoryFact, MemberRole, MemberStatus};

/// Process-wide reassignment constraints, built once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityRuleSet {
    allowed_statuses: HashSet<MemberStatus>,
    allowed_roles: HashSet<MemberRole>,
    allow_reuse: bool,
}

impl EligibilityRuleSet {
    pub fn new(
        allow_reuse: bool,
        statuses: impl IntoIterator<Item = MemberStatus>,
        roles: impl IntoIterator<Item = MemberRole>,
    ) -> Self {
        Self {
            allowed_statuses: statuses.into_iter().collect(),
            allowed_roles: roles.into_iter().collect(),
            allow_reuse,
        }
    }

    pub fn allows_reuse(&self) -> bool {
        self.allow_reuse
    }

    pub fn allows_status(&self, status: MemberStatus) -> bool {
        self.allowed_statuses.contains(&status)
    }

    pub fn allows_role(&self, role: MemberRole) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Decides whether a candidate may become a reviewer.
///
/// Holds only the immutable rule set, so a single instance can be shared by
/// every request without locking. Empty status or role sets reject everyone.
#[derive(Debug, Clone)]
pub struct EligibilityPolicy {
    rules: EligibilityRuleSet,
}

impl EligibilityPolicy {
    pub fn new(rules: EligibilityRuleSet) -> Self {
        Self { rules }
    }

    pub fn is_eligible(&self, fact: &MemberHistoryFact) -> bool {
        if fact.was_assigned_before && !self.rules.allow_reuse {
            return false;
        }

        self.rules.allows_status(fact.status) && self.rules.allows_role(fact.role)
    }
}
