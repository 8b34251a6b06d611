//! In-memory store used by the engine's unit tests.
//!
//! Writes made through a transaction are staged and only become visible on
//! commit; a transaction dropped without commit counts as rolled back.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{PullRequestStore, ReassignStore, ReassignTx};
use crate::errors::AppError;
use crate::models::{
    Member, MemberHistoryFact, MemberId, MemberRole, MemberStatus, NewPullRequest, PrStatus,
    PullRequest, PullRequestId,
};

fn uuid_for(name: &str) -> String {
    let n = name.bytes().fold(0u128, |acc, b| acc.wrapping_mul(256).wrapping_add(b as u128));
    uuid::Uuid::from_u128(n).to_string()
}

pub fn member_id(name: &str) -> MemberId {
    MemberId::from_stored(uuid_for(name))
}

pub fn pr_id(name: &str) -> PullRequestId {
    PullRequestId::from_stored(uuid_for(name))
}

pub fn fact(
    name: &str,
    status: MemberStatus,
    role: MemberRole,
    was_assigned_before: bool,
    is_current_reviewer: bool,
) -> MemberHistoryFact {
    MemberHistoryFact {
        id: member_id(name),
        status,
        role,
        was_assigned_before,
        is_current_reviewer,
    }
}

fn reviewer(id: MemberId) -> Member {
    Member {
        name: id.to_string(),
        id,
        status: MemberStatus::Active,
        team: Some("backend".to_string()),
    }
}

#[derive(Default)]
struct FakeState {
    members: HashSet<MemberId>,
    pull_requests: HashMap<PullRequestId, PullRequest>,
    rosters: HashMap<PullRequestId, Vec<MemberHistoryFact>>,
    commits: usize,
    rollbacks: usize,
    merge_writes: usize,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    state: Arc<Mutex<FakeState>>,
    fail_begin: bool,
    fail_rollback: bool,
    hang_on_load: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_begin(mut self) -> Self {
        self.fail_begin = true;
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn hanging_load(mut self) -> Self {
        self.hang_on_load = true;
        self
    }

    pub fn seed_member(&self, name: &str) {
        self.state.lock().unwrap().members.insert(member_id(name));
    }

    /// Insert or reset an open pull request at version 1.
    pub fn seed_pull_request(&self, pr: &str, author: &str, reviewers: &[&str]) {
        let pull_request = PullRequest {
            id: pr_id(pr),
            name: format!("PR {}", pr),
            author_id: member_id(author),
            status: PrStatus::Open,
            created_at: Utc::now(),
            merged_at: None,
            version: 1,
            reviewers: reviewers.iter().map(|r| reviewer(member_id(r))).collect(),
        };
        let mut state = self.state.lock().unwrap();
        state.members.insert(member_id(author));
        state.pull_requests.insert(pr_id(pr), pull_request);
    }

    pub fn seed_roster(&self, pr: &str, roster: Vec<MemberHistoryFact>) {
        self.state.lock().unwrap().rosters.insert(pr_id(pr), roster);
    }

    pub fn pull_request(&self, pr: &str) -> Option<PullRequest> {
        self.state.lock().unwrap().pull_requests.get(&pr_id(pr)).cloned()
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }

    pub fn merge_writes(&self) -> usize {
        self.state.lock().unwrap().merge_writes
    }
}

pub struct FakeTx {
    shared: Arc<Mutex<FakeState>>,
    staged: HashMap<PullRequestId, PullRequest>,
    finished: bool,
    fail_rollback: bool,
    hang_on_load: bool,
}

impl Drop for FakeTx {
    fn drop(&mut self) {
        if !self.finished {
            if let Ok(mut state) = self.shared.lock() {
                state.rollbacks += 1;
            }
        }
    }
}

#[async_trait]
impl ReassignStore for FakeStore {
    type Tx = FakeTx;

    async fn begin_reassign(&self) -> Result<FakeTx, AppError> {
        if self.fail_begin {
            return Err(AppError::Internal("storage unavailable".to_string()));
        }
        Ok(FakeTx {
            shared: Arc::clone(&self.state),
            staged: HashMap::new(),
            finished: false,
            fail_rollback: self.fail_rollback,
            hang_on_load: self.hang_on_load,
        })
    }
}

#[async_trait]
impl ReassignTx for FakeTx {
    async fn load_history(
        &mut self,
        pr_id: &PullRequestId,
    ) -> Result<Vec<MemberHistoryFact>, AppError> {
        if self.hang_on_load {
            std::future::pending::<()>().await;
        }

        let state = self.shared.lock().unwrap();
        let pr = state
            .pull_requests
            .get(pr_id)
            .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", pr_id)))?;
        if pr.is_merged() {
            return Err(AppError::Conflict("cannot reassign on merged PR".to_string()));
        }
        match state.rosters.get(pr_id) {
            Some(roster) if !roster.is_empty() => Ok(roster.clone()),
            _ => Err(AppError::NoContent(format!("No roster for pull request {}", pr_id))),
        }
    }

    async fn assign_reviewer(
        &mut self,
        pr_id: &PullRequestId,
        old: &MemberId,
        new: &MemberId,
    ) -> Result<PullRequest, AppError> {
        let mut pr = match self.staged.get(pr_id) {
            Some(pr) => pr.clone(),
            None => self
                .shared
                .lock()
                .unwrap()
                .pull_requests
                .get(pr_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", pr_id)))?,
        };

        if !pr.has_reviewer(old) {
            return Err(AppError::Conflict("reviewer is not assigned to this PR".to_string()));
        }

        pr.reviewers.retain(|m| &m.id != old);
        pr.reviewers.push(reviewer(new.clone()));
        pr.version += 1;
        self.staged.insert(pr_id.clone(), pr.clone());
        Ok(pr)
    }

    async fn commit(mut self) -> Result<(), AppError> {
        let mut state = self.shared.lock().unwrap();
        for (id, pr) in self.staged.drain() {
            state.pull_requests.insert(id, pr);
        }
        state.commits += 1;
        drop(state);
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), AppError> {
        self.finished = true;
        if self.fail_rollback {
            return Err(AppError::Internal("rollback refused".to_string()));
        }
        self.shared.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

#[async_trait]
impl PullRequestStore for FakeStore {
    async fn create_pull_request(&self, new: &NewPullRequest) -> Result<PullRequest, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.pull_requests.contains_key(&new.id) {
            return Err(AppError::Duplicate(format!("Pull request {} already exists", new.id)));
        }
        if !state.members.contains(&new.author_id) {
            return Err(AppError::NotFound(format!("Author {} not found", new.author_id)));
        }
        let pr = PullRequest {
            id: new.id.clone(),
            name: new.name.clone(),
            author_id: new.author_id.clone(),
            status: PrStatus::Open,
            created_at: Utc::now(),
            merged_at: None,
            version: 1,
            reviewers: Vec::new(),
        };
        state.pull_requests.insert(new.id.clone(), pr.clone());
        Ok(pr)
    }

    async fn get_pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, AppError> {
        Ok(self.state.lock().unwrap().pull_requests.get(id).cloned())
    }

    async fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, AppError> {
        let mut state = self.state.lock().unwrap();
        state.merge_writes += 1;
        let pr = state
            .pull_requests
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", id)))?;
        if pr.status == PrStatus::Open {
            pr.status = PrStatus::Merged;
            pr.merged_at = Some(merged_at);
            pr.version += 1;
        }
        Ok(pr.clone())
    }
}
