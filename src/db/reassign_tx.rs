//! SQLite unit of work for reviewer reassignment.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};

use super::repository::{fetch_pull_request, link_reviewer};
use super::Repository;
use crate::errors::AppError;
use crate::models::{
    MemberHistoryFact, MemberId, MemberRole, MemberStatus, PrStatus, PullRequest, PullRequestId,
};
use crate::review::{ReassignStore, ReassignTx};

/// A reassignment running inside one SQLite transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
pub struct SqliteReassignTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl ReassignStore for Repository {
    type Tx = SqliteReassignTx;

    async fn begin_reassign(&self) -> Result<SqliteReassignTx, AppError> {
        let tx = self.pool().begin().await?;
        Ok(SqliteReassignTx { tx })
    }
}

#[async_trait]
impl ReassignTx for SqliteReassignTx {
    async fn load_history(
        &mut self,
        pr_id: &PullRequestId,
    ) -> Result<Vec<MemberHistoryFact>, AppError> {
        // A no-op write takes the database write lock up front, so two
        // reassignments of the same pull request cannot interleave.
        let touched = sqlx::query("UPDATE pull_requests SET version = version WHERE id = ?")
            .bind(pr_id.as_str())
            .execute(&mut *self.tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Pull request {} not found", pr_id)));
        }

        let pr = sqlx::query(
            r#"SELECT pr.status, pr.author_id, m.team_id
            FROM pull_requests pr
            LEFT JOIN members m ON m.id = pr.author_id
            WHERE pr.id = ?"#,
        )
        .bind(pr_id.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        if PrStatus::from_db(pr.get("status")) == PrStatus::Merged {
            return Err(AppError::Conflict("cannot reassign on merged PR".to_string()));
        }

        let team_id: Option<i64> = pr.get("team_id");
        let Some(team_id) = team_id else {
            return Err(AppError::NoContent(format!(
                "Author of pull request {} has no team",
                pr_id
            )));
        };
        let author_id: String = pr.get("author_id");

        let rows = sqlx::query(
            r#"SELECT
                m.id,
                m.is_active,
                EXISTS (
                    SELECT 1 FROM pr_reviewers r WHERE r.pr_id = ?1 AND r.member_id = m.id
                ) AS is_current,
                EXISTS (
                    SELECT 1 FROM pr_reviewer_history h WHERE h.pr_id = ?1 AND h.member_id = m.id
                ) AS was_assigned
            FROM members m
            WHERE m.team_id = ?2
            ORDER BY m.name, m.id"#,
        )
        .bind(pr_id.as_str())
        .bind(team_id)
        .fetch_all(&mut *self.tx)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NoContent(format!("No roster for pull request {}", pr_id)));
        }

        let facts = rows
            .iter()
            .map(|row| {
                let id: String = row.get("id");
                let is_active: i32 = row.get("is_active");
                let is_current = row.get::<i64, _>("is_current") != 0;
                let was_assigned = row.get::<i64, _>("was_assigned") != 0;

                let role = if id == author_id {
                    MemberRole::Author
                } else if was_assigned && !is_current {
                    MemberRole::Reassigned
                } else {
                    MemberRole::Default
                };

                MemberHistoryFact {
                    id: MemberId::from_stored(id),
                    status: MemberStatus::from_active(is_active != 0),
                    role,
                    was_assigned_before: was_assigned,
                    is_current_reviewer: is_current,
                }
            })
            .collect();

        Ok(facts)
    }

    async fn assign_reviewer(
        &mut self,
        pr_id: &PullRequestId,
        old: &MemberId,
        new: &MemberId,
    ) -> Result<PullRequest, AppError> {
        let removed = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND member_id = ?")
            .bind(pr_id.as_str())
            .bind(old.as_str())
            .execute(&mut *self.tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(AppError::Conflict("reviewer is not assigned to this PR".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        link_reviewer(&mut self.tx, pr_id.as_str(), new.as_str(), &now).await?;

        sqlx::query("UPDATE pull_requests SET version = version + 1 WHERE id = ?")
            .bind(pr_id.as_str())
            .execute(&mut *self.tx)
            .await?;

        fetch_pull_request(&mut self.tx, pr_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", pr_id)))
    }

    async fn commit(self) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
