use crate::Database;
use crate::models::{MemberRow, PullRequestRow, PullRequestShortRow, UserRow, format_timestamp};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use review_types::models::TeamMember;
use rusqlite::{Connection, TransactionBehavior, types::ToSql};
use tracing::debug;

/// Result of the guarded `OPEN -> MERGED` update.
pub enum MergeOutcome {
    /// This call performed the transition and stamped `merged_at`.
    Merged(PullRequestRow),
    /// The guard did not match; the row is returned unchanged.
    AlreadyMerged(PullRequestRow),
    NotFound,
}

/// Result of the guarded reviewer replacement.
pub enum ReplaceOutcome {
    Replaced(PullRequestRow),
    /// The pull request was merged, the outgoing reviewer was no longer
    /// assigned, or the replacement got assigned concurrently.
    Conflict,
}

impl Database {
    // -- Teams --

    pub fn team_exists(&self, team_name: &str) -> Result<bool> {
        self.with_conn(|conn| query_team_exists(conn, team_name))
    }

    /// Insert a team and upsert its members in one transaction.
    /// Returns false, writing nothing, if the team name is already taken.
    pub fn create_team(&self, team_name: &str, members: &[TeamMember]) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            match tx.execute("INSERT INTO teams (team_name) VALUES (?1)", [team_name]) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(false),
                Err(e) => return Err(e.into()),
            }

            // An existing user id moves to this team
            for m in members {
                tx.execute(
                    "INSERT INTO users (user_id, username, team_name, is_active)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (user_id) DO UPDATE SET
                        username = excluded.username,
                        team_name = excluded.team_name,
                        is_active = excluded.is_active",
                    rusqlite::params![m.id, m.username, team_name, m.is_active],
                )?;
            }

            tx.commit()?;
            Ok(true)
        })
    }

    /// Members of a team ordered by user id, or `None` if the team does not exist.
    pub fn get_team_members(&self, team_name: &str) -> Result<Option<Vec<MemberRow>>> {
        self.with_conn(|conn| {
            if !query_team_exists(conn, team_name)? {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT user_id, username, is_active FROM users
                 WHERE team_name = ?1
                 ORDER BY user_id",
            )?;
            let rows = stmt
                .query_map([team_name], |row| {
                    Ok(MemberRow {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        is_active: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Some(rows))
        })
    }

    /// Active members of a team minus `exclude`, ordered by user id.
    pub fn active_members_excluding(&self, team_name: &str, exclude: &[String]) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT user_id FROM users WHERE team_name = ?1 AND is_active = 1",
            );
            if !exclude.is_empty() {
                let placeholders: Vec<String> =
                    (2..=exclude.len() + 1).map(|i| format!("?{}", i)).collect();
                sql.push_str(&format!(" AND user_id NOT IN ({})", placeholders.join(", ")));
            }
            sql.push_str(" ORDER BY user_id");

            let mut params: Vec<&dyn ToSql> = Vec::with_capacity(exclude.len() + 1);
            params.push(&team_name);
            params.extend(exclude.iter().map(|id| id as &dyn ToSql));

            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params.as_slice(), |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;

            Ok(ids)
        })
    }

    // -- Users --

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, user_id))
    }

    pub fn get_user_team(&self, user_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT team_name FROM users WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Returns the updated user, or `None` if no such user exists.
    pub fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            conn.query_row(
                "UPDATE users SET is_active = ?2 WHERE user_id = ?1
                 RETURNING user_id, username, team_name, is_active",
                rusqlite::params![user_id, is_active],
                map_user_row,
            )
            .optional()
        })
    }

    // -- Pull requests --

    pub fn pull_request_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Insert an `OPEN` pull request with its reviewer slots in list order.
    /// Returns `None`, writing nothing, if the id is already taken.
    pub fn insert_pull_request(
        &self,
        id: &str,
        name: &str,
        author_id: &str,
        reviewers: &[String],
        created_at: &DateTime<Utc>,
    ) -> Result<Option<PullRequestRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let inserted = tx.execute(
                "INSERT INTO pull_requests
                    (pull_request_id, pull_request_name, author_id, status, created_at)
                 VALUES (?1, ?2, ?3, 'OPEN', ?4)",
                rusqlite::params![id, name, author_id, format_timestamp(created_at)],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            for (slot, reviewer) in reviewers.iter().enumerate() {
                tx.execute(
                    "INSERT INTO pull_request_reviewers (pull_request_id, slot, user_id)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![id, slot as i64, reviewer],
                )?;
            }

            let row = query_pull_request(&tx, id)?
                .ok_or_else(|| anyhow!("Pull request {} missing right after insert", id))?;
            tx.commit()?;
            Ok(Some(row))
        })
    }

    pub fn get_pull_request(&self, id: &str) -> Result<Option<PullRequestRow>> {
        self.with_conn(|conn| query_pull_request(conn, id))
    }

    /// Guarded transition: only a row still `OPEN` is stamped, so concurrent
    /// merges write `merged_at` exactly once.
    pub fn merge_pull_request(&self, id: &str, merged_at: &DateTime<Utc>) -> Result<MergeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE pull_requests SET status = 'MERGED', merged_at = ?2
                 WHERE pull_request_id = ?1 AND status = 'OPEN'",
                rusqlite::params![id, format_timestamp(merged_at)],
            )?;
            let row = query_pull_request(&tx, id)?;
            tx.commit()?;

            Ok(match (row, changed) {
                (None, _) => MergeOutcome::NotFound,
                (Some(row), 0) => MergeOutcome::AlreadyMerged(row),
                (Some(row), _) => MergeOutcome::Merged(row),
            })
        })
    }

    /// Swap `old_reviewer` for `new_reviewer` in the same slot, but only while
    /// the pull request is `OPEN` and `old_reviewer` is still assigned.
    pub fn replace_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> Result<ReplaceOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let updated = tx.execute(
                "UPDATE pull_request_reviewers SET user_id = ?3
                 WHERE pull_request_id = ?1 AND user_id = ?2
                   AND EXISTS (
                       SELECT 1 FROM pull_requests
                       WHERE pull_request_id = ?1 AND status = 'OPEN'
                   )",
                rusqlite::params![pr_id, old_reviewer, new_reviewer],
            );
            let changed = match updated {
                Ok(n) => n,
                Err(e) if is_unique_violation(&e) => return Ok(ReplaceOutcome::Conflict),
                Err(e) => return Err(e.into()),
            };
            if changed == 0 {
                debug!("Reviewer replacement guard missed on {}", pr_id);
                return Ok(ReplaceOutcome::Conflict);
            }

            let row = query_pull_request(&tx, pr_id)?
                .ok_or_else(|| anyhow!("Pull request {} missing after reviewer update", pr_id))?;
            tx.commit()?;
            Ok(ReplaceOutcome::Replaced(row))
        })
    }

    /// Every pull request (any status) that lists `user_id` as a reviewer.
    pub fn get_reviews_for_user(&self, user_id: &str) -> Result<Vec<PullRequestShortRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.pull_request_id, p.pull_request_name, p.author_id, p.status
                 FROM pull_requests p
                 JOIN pull_request_reviewers r ON r.pull_request_id = p.pull_request_id
                 WHERE r.user_id = ?1
                 ORDER BY p.pull_request_id",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(PullRequestShortRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        author_id: row.get(2)?,
                        status: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_team_exists(conn: &Connection, team_name: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = ?1)",
        [team_name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        user_id: row.get(0)?,
        username: row.get(1)?,
        team_name: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn query_user(conn: &Connection, user_id: &str) -> Result<Option<UserRow>> {
    conn.query_row(
        "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?1",
        [user_id],
        map_user_row,
    )
    .optional()
}

fn query_pull_request(conn: &Connection, id: &str) -> Result<Option<PullRequestRow>> {
    let row = conn
        .query_row(
            "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
             FROM pull_requests WHERE pull_request_id = ?1",
            [id],
            |row| {
                Ok(PullRequestRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    author_id: row.get(2)?,
                    status: row.get(3)?,
                    reviewers: Vec::new(),
                    created_at: row.get(4)?,
                    merged_at: row.get(5)?,
                })
            },
        )
        .optional()?;

    let Some(mut row) = row else {
        return Ok(None);
    };
    row.reviewers = query_reviewers(conn, id)?;
    Ok(Some(row))
}

fn query_reviewers(conn: &Connection, pr_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT user_id FROM pull_request_reviewers
         WHERE pull_request_id = ?1
         ORDER BY slot",
    )?;
    let ids = stmt
        .query_map([pr_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
