//! Database repository for teams, members and pull requests.
//!
//! Uses prepared statements and transactions for data integrity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Member, MemberId, MemberStatus, NewMember, NewPullRequest, PrStatus, PullRequest,
    PullRequestId, PullRequestShort, Team,
};
use crate::review::PullRequestStore;

/// Reviewers picked automatically when a pull request is opened.
const INITIAL_REVIEWERS: i64 = 2;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== TEAM OPERATIONS ====================

    /// Create a team and upsert its members into it.
    ///
    /// A team needs at least one member; nothing is written otherwise.
    pub async fn create_team(&self, name: &str, members: &[NewMember]) -> Result<Team, AppError> {
        if members.is_empty() {
            return Err(AppError::Validation(format!(
                "Team {} needs at least one member",
                name
            )));
        }

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM teams WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::Duplicate(format!("Team {} already exists", name)));
        }

        let now = Utc::now().to_rfc3339();
        let team_id: i64 =
            sqlx::query_scalar("INSERT INTO teams (name, created_at) VALUES (?, ?) RETURNING id")
                .bind(name)
                .bind(&now)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| unique_as_duplicate(e, format!("Team {} already exists", name)))?;

        for member in members {
            sqlx::query(
                r#"INSERT INTO members (id, name, is_active, team_id, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    is_active = excluded.is_active,
                    team_id = excluded.team_id,
                    updated_at = excluded.updated_at"#,
            )
            .bind(member.id.as_str())
            .bind(&member.name)
            .bind(member.status.is_active() as i32)
            .bind(team_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_team(name).await
    }

    /// Get a team with its members.
    pub async fn get_team(&self, name: &str) -> Result<Team, AppError> {
        let rows = sqlx::query(
            r#"SELECT m.id, m.name, m.is_active, t.name AS team_name
            FROM members m
            INNER JOIN teams t ON t.id = m.team_id
            WHERE t.name = ?
            ORDER BY m.name"#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Team {} not found", name)));
        }

        Ok(Team {
            name: name.to_string(),
            members: rows.iter().map(member_from_row).collect(),
        })
    }

    // ==================== MEMBER OPERATIONS ====================

    /// Get a member by ID.
    pub async fn get_member(&self, id: &MemberId) -> Result<Option<Member>, AppError> {
        let row = sqlx::query(
            r#"SELECT m.id, m.name, m.is_active, t.name AS team_name
            FROM members m
            LEFT JOIN teams t ON t.id = m.team_id
            WHERE m.id = ?"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }

    /// Activate or deactivate a member.
    pub async fn set_member_active(&self, id: &MemberId, active: bool) -> Result<Member, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE members SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active as i32)
            .bind(&now)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Member {} not found", id)));
        }

        self.get_member(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))
    }

    /// Pull requests the member currently reviews, newest first.
    pub async fn member_reviews(&self, id: &MemberId) -> Result<Vec<PullRequestShort>, AppError> {
        let rows = sqlx::query(
            r#"SELECT pr.id, pr.name, pr.author_id, pr.status
            FROM pr_reviewers r
            INNER JOIN pull_requests pr ON pr.id = r.pr_id
            WHERE r.member_id = ?
            ORDER BY pr.created_at DESC"#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PullRequestShort {
                pull_request_id: PullRequestId::from_stored(row.get("id")),
                pull_request_name: row.get("name"),
                author_id: MemberId::from_stored(row.get("author_id")),
                status: PrStatus::from_db(row.get("status")),
            })
            .collect())
    }
}

#[async_trait]
impl PullRequestStore for Repository {
    async fn create_pull_request(&self, new: &NewPullRequest) -> Result<PullRequest, AppError> {
        let duplicate = || format!("Pull request {} already exists", new.id);
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM pull_requests WHERE id = ?")
            .bind(new.id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(AppError::Duplicate(duplicate()));
        }

        let author = sqlx::query("SELECT team_id FROM members WHERE id = ?")
            .bind(new.author_id.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", new.author_id)))?;
        let team_id: Option<i64> = author.get("team_id");

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at, version) VALUES (?, ?, ?, ?, ?, NULL, 1)",
        )
        .bind(new.id.as_str())
        .bind(&new.name)
        .bind(new.author_id.as_str())
        .bind(PrStatus::Open.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_as_duplicate(e, duplicate()))?;

        if let Some(team_id) = team_id {
            let reviewers: Vec<String> = sqlx::query_scalar(
                r#"SELECT id FROM members
                WHERE team_id = ? AND is_active = 1 AND id != ?
                ORDER BY RANDOM()
                LIMIT ?"#,
            )
            .bind(team_id)
            .bind(new.author_id.as_str())
            .bind(INITIAL_REVIEWERS)
            .fetch_all(&mut *tx)
            .await?;

            for reviewer in &reviewers {
                link_reviewer(&mut tx, new.id.as_str(), reviewer, &now).await?;
            }
        }

        let pr = fetch_pull_request(&mut tx, &new.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("created pull request {} vanished", new.id)))?;

        tx.commit().await?;
        Ok(pr)
    }

    async fn get_pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_pull_request(&mut conn, id).await
    }

    async fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        // Only an open row changes; a concurrent merge leaves this a no-op.
        sqlx::query(
            "UPDATE pull_requests SET status = ?, merged_at = ?, version = version + 1 WHERE id = ? AND status = ?",
        )
        .bind(PrStatus::Merged.as_str())
        .bind(merged_at.to_rfc3339())
        .bind(id.as_str())
        .bind(PrStatus::Open.as_str())
        .execute(&mut *tx)
        .await?;

        let pr = fetch_pull_request(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pull request {} not found", id)))?;

        tx.commit().await?;
        Ok(pr)
    }
}

/// Add a current reviewer link and record it in the reviewer history.
pub(crate) async fn link_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    member_id: &str,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO pr_reviewers (pr_id, member_id, assigned_at) VALUES (?, ?, ?)")
        .bind(pr_id)
        .bind(member_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO pr_reviewer_history (pr_id, member_id, first_assigned_at) VALUES (?, ?, ?)",
    )
    .bind(pr_id)
    .bind(member_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load a pull request with its current reviewers.
pub(crate) async fn fetch_pull_request(
    conn: &mut SqliteConnection,
    id: &PullRequestId,
) -> Result<Option<PullRequest>, AppError> {
    let row = sqlx::query(
        "SELECT id, name, author_id, status, created_at, merged_at, version FROM pull_requests WHERE id = ?",
    )
    .bind(id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let reviewer_rows = sqlx::query(
        r#"SELECT m.id, m.name, m.is_active, t.name AS team_name
        FROM pr_reviewers r
        INNER JOIN members m ON m.id = r.member_id
        LEFT JOIN teams t ON t.id = m.team_id
        WHERE r.pr_id = ?
        ORDER BY r.assigned_at, m.name"#,
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let created_at: String = row.get("created_at");
    let merged_at: Option<String> = row.get("merged_at");

    Ok(Some(PullRequest {
        id: PullRequestId::from_stored(row.get("id")),
        name: row.get("name"),
        author_id: MemberId::from_stored(row.get("author_id")),
        status: PrStatus::from_db(row.get("status")),
        created_at: parse_timestamp(&created_at)?,
        merged_at: merged_at.as_deref().map(parse_timestamp).transpose()?,
        version: row.get("version"),
        reviewers: reviewer_rows.iter().map(member_from_row).collect(),
    }))
}

// Helper functions for row conversion

fn member_from_row(row: &SqliteRow) -> Member {
    let is_active: i32 = row.get("is_active");
    Member {
        id: MemberId::from_stored(row.get("id")),
        name: row.get("name"),
        status: MemberStatus::from_active(is_active != 0),
        team: row.get("team_name"),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("bad timestamp {:?}: {}", raw, e)))
}

fn unique_as_duplicate(err: sqlx::Error, message: String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate(message),
        _ => AppError::from(err),
    }
}
