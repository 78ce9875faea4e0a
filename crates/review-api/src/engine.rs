//! Reviewer assignment and pull request state transitions.
//!
//! The engine keeps no state of its own: every guarded mutation is a single
//! conditional write in the store, so concurrent requests only race on the
//! database, never on memory.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use review_db::Database;
use review_db::queries::{MergeOutcome, ReplaceOutcome};
use review_types::models::{MAX_REVIEWERS, PullRequest, PullRequestShort, Team, TeamMember, User};

use crate::error::ReviewError;
use crate::random::RandomSource;

/// Outcome of a successful reviewer swap.
#[derive(Debug, Clone)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    pub replaced_by: String,
}

pub struct AssignmentEngine {
    db: Arc<Database>,
    rng: Arc<dyn RandomSource>,
}

impl AssignmentEngine {
    pub fn new(db: Arc<Database>, rng: Arc<dyn RandomSource>) -> Self {
        Self { db, rng }
    }

    // -- Teams & users --

    pub fn create_team(&self, team: Team) -> Result<Team, ReviewError> {
        validate_team(&team)?;

        if self.db.team_exists(&team.name)? {
            warn!("Team {} already exists", team.name);
            return Err(ReviewError::TeamExists(team.name));
        }

        // The unique team name also catches a creation racing past the probe
        if !self.db.create_team(&team.name, &team.members)? {
            warn!("Team {} was created concurrently", team.name);
            return Err(ReviewError::TeamExists(team.name));
        }

        info!("Team {} created with {} members", team.name, team.members.len());
        self.load_team(&team.name)
    }

    pub fn get_team(&self, team_name: &str) -> Result<Team, ReviewError> {
        require("team_name", team_name)?;
        self.load_team(team_name)
    }

    pub fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, ReviewError> {
        require("user_id", user_id)?;

        let user = self
            .db
            .set_user_active(user_id, is_active)?
            .ok_or_else(|| ReviewError::UserNotFound(user_id.to_string()))?;

        info!("User {} is_active={}", user_id, is_active);
        Ok(user.into_model())
    }

    /// Pull requests that currently list `user_id` as a reviewer, any status.
    pub fn user_reviews(&self, user_id: &str) -> Result<Vec<PullRequestShort>, ReviewError> {
        require("user_id", user_id)?;

        if self.db.get_user_team(user_id)?.is_none() {
            return Err(ReviewError::UserNotFound(user_id.to_string()));
        }

        let rows = self.db.get_reviews_for_user(user_id)?;
        let reviews = rows
            .into_iter()
            .map(|row| row.into_model())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(reviews)
    }

    // -- Pull requests --

    /// Open a pull request with up to two reviewers drawn at random from the
    /// author's active teammates.
    pub fn create_pull_request(
        &self,
        id: &str,
        name: &str,
        author_id: &str,
    ) -> Result<PullRequest, ReviewError> {
        require("pull_request_id", id)?;
        require("pull_request_name", name)?;
        require("author_id", author_id)?;

        if self.db.pull_request_exists(id)? {
            warn!("Pull request {} already exists", id);
            return Err(ReviewError::PrExists(id.to_string()));
        }

        let team_name = self
            .db
            .get_user_team(author_id)?
            .ok_or_else(|| ReviewError::AuthorNotFound(author_id.to_string()))?;

        let candidates = self
            .db
            .active_members_excluding(&team_name, &[author_id.to_string()])?;
        let reviewers = select_reviewers(self.rng.as_ref(), candidates);

        let row = self
            .db
            .insert_pull_request(id, name, author_id, &reviewers, &Utc::now())?
            .ok_or_else(|| ReviewError::PrExists(id.to_string()))?;

        info!(
            "Pull request {} opened by {} with reviewers {:?}",
            id, author_id, reviewers
        );
        Ok(row.into_model()?)
    }

    /// Merge is idempotent: an already merged pull request comes back unchanged.
    pub fn merge_pull_request(&self, id: &str) -> Result<PullRequest, ReviewError> {
        require("pull_request_id", id)?;

        match self.db.merge_pull_request(id, &Utc::now())? {
            MergeOutcome::Merged(row) => {
                info!("Pull request {} merged", id);
                Ok(row.into_model()?)
            }
            MergeOutcome::AlreadyMerged(row) => Ok(row.into_model()?),
            MergeOutcome::NotFound => Err(ReviewError::PrNotFound(id.to_string())),
        }
    }

    /// Replace `old_reviewer` with a random active member of their team.
    ///
    /// The replacement pool excludes the outgoing reviewer, the author and
    /// anyone already reviewing the pull request. The final write re-checks
    /// that the pull request is still open and `old_reviewer` still assigned.
    pub fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
    ) -> Result<Reassignment, ReviewError> {
        require("pull_request_id", pr_id)?;
        require("old_user_id", old_reviewer)?;

        let pr = self
            .db
            .get_pull_request(pr_id)?
            .ok_or_else(|| ReviewError::PrNotFound(pr_id.to_string()))?
            .into_model()?;

        if pr.is_merged() {
            warn!("Reassignment rejected: {} is merged", pr_id);
            return Err(ReviewError::PrMerged(pr_id.to_string()));
        }
        if !pr.has_reviewer(old_reviewer) {
            warn!("Reassignment rejected: {} not assigned to {}", old_reviewer, pr_id);
            return Err(ReviewError::NotAssigned {
                pr_id: pr_id.to_string(),
                reviewer: old_reviewer.to_string(),
            });
        }

        let team_name = self
            .db
            .get_user_team(old_reviewer)?
            .ok_or_else(|| ReviewError::UserNotFound(old_reviewer.to_string()))?;

        let mut exclude = pr.assigned_reviewers.clone();
        if !exclude.contains(&pr.author_id) {
            exclude.push(pr.author_id.clone());
        }
        let candidates = self.db.active_members_excluding(&team_name, &exclude)?;
        let Some(new_reviewer) = pick_one(self.rng.as_ref(), candidates) else {
            warn!("No replacement for {} on {} in team {}", old_reviewer, pr_id, team_name);
            return Err(ReviewError::NoCandidate(team_name));
        };

        match self.db.replace_reviewer(pr_id, old_reviewer, &new_reviewer)? {
            ReplaceOutcome::Replaced(row) => {
                info!(
                    "Pull request {}: reviewer {} replaced by {}",
                    pr_id, old_reviewer, new_reviewer
                );
                Ok(Reassignment {
                    pull_request: row.into_model()?,
                    replaced_by: new_reviewer,
                })
            }
            ReplaceOutcome::Conflict => {
                warn!("Pull request {} changed during reassignment", pr_id);
                Err(ReviewError::ReassignConflict(pr_id.to_string()))
            }
        }
    }

    fn load_team(&self, team_name: &str) -> Result<Team, ReviewError> {
        let members = self
            .db
            .get_team_members(team_name)?
            .ok_or_else(|| ReviewError::TeamNotFound(team_name.to_string()))?;

        Ok(Team {
            name: team_name.to_string(),
            members: members.into_iter().map(|m| m.into_model()).collect(),
        })
    }
}

/// Shuffle the candidate pool and keep at most [`MAX_REVIEWERS`].
fn select_reviewers(rng: &dyn RandomSource, mut candidates: Vec<String>) -> Vec<String> {
    rng.shuffle(&mut candidates);
    candidates.truncate(MAX_REVIEWERS);
    candidates
}

fn pick_one(rng: &dyn RandomSource, mut candidates: Vec<String>) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.pick(candidates.len());
    Some(candidates.swap_remove(idx))
}

fn require(field: &str, value: &str) -> Result<(), ReviewError> {
    if value.is_empty() {
        return Err(ReviewError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_team(team: &Team) -> Result<(), ReviewError> {
    require("team_name", &team.name)?;
    if team.members.is_empty() {
        return Err(ReviewError::Validation("members are required".into()));
    }
    for TeamMember { id, username, .. } in &team.members {
        if id.is_empty() || username.is_empty() {
            return Err(ReviewError::Validation(format!(
                "member '{}' needs a user_id and username",
                id
            )));
        }
    }
    Ok(())
}
