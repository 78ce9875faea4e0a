use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use review_types::api::{
    CreatePullRequest, MergePullRequest, PullRequestResponse, ReassignRequest, ReassignResponse,
};

use crate::error::ReviewError;
use crate::state::{AppState, run_blocking};

/// POST /pullRequest/create — open a pull request and auto-assign reviewers.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ReviewError> {
    let Json(req) = payload?;

    let pr = run_blocking(&state, move |engine| {
        engine.create_pull_request(&req.pull_request_id, &req.pull_request_name, &req.author_id)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestResponse { pr: pr.into() }),
    ))
}

/// POST /pullRequest/merge — idempotent.
pub async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ReviewError> {
    let Json(req) = payload?;

    let pr = run_blocking(&state, move |engine| {
        engine.merge_pull_request(&req.pull_request_id)
    })
    .await?;

    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

/// POST /pullRequest/reassign
pub async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ReviewError> {
    let Json(req) = payload?;

    let done = run_blocking(&state, move |engine| {
        engine.reassign_reviewer(&req.pull_request_id, &req.old_user_id)
    })
    .await?;

    Ok(Json(ReassignResponse {
        pr: done.pull_request.into(),
        replaced_by: done.replaced_by,
    }))
}
