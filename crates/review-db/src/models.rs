//! Database row types — these map directly to SQLite rows.
//! Distinct from review-types models to keep the DB layer independent;
//! `into_model` does the parsing at the boundary.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use review_types::models::{PrStatus, PullRequest, PullRequestShort, TeamMember, User};

pub struct MemberRow {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}

pub struct PullRequestRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
    pub reviewers: Vec<String>,
    pub created_at: String,
    pub merged_at: Option<String>,
}

pub struct PullRequestShortRow {
    pub id: String,
    pub name: String,
    pub author_id: String,
    pub status: String,
}

/// Timestamps are stored as RFC 3339 text with millisecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}

impl MemberRow {
    pub fn into_model(self) -> TeamMember {
        TeamMember {
            id: self.user_id,
            username: self.username,
            is_active: self.is_active,
        }
    }
}

impl UserRow {
    pub fn into_model(self) -> User {
        User {
            id: self.user_id,
            username: self.username,
            team_name: self.team_name,
            is_active: self.is_active,
        }
    }
}

impl PullRequestRow {
    pub fn into_model(self) -> Result<PullRequest> {
        let status: PrStatus = self
            .status
            .parse()
            .with_context(|| format!("pull request '{}'", self.id))?;
        let created_at = parse_timestamp(&self.created_at)?;
        let merged_at = self.merged_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(PullRequest {
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            status,
            assigned_reviewers: self.reviewers,
            created_at,
            merged_at,
        })
    }
}

impl PullRequestShortRow {
    pub fn into_model(self) -> Result<PullRequestShort> {
        let status: PrStatus = self
            .status
            .parse()
            .with_context(|| format!("pull request '{}'", self.id))?;

        Ok(PullRequestShort {
            id: self.id,
            name: self.name,
            author_id: self.author_id,
            status,
        })
    }
}
