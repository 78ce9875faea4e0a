use axum::{
    Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
};

use review_types::api::{
    PullRequestShortDto, SetActiveRequest, SetActiveResponse, UserQuery, UserReviewsResponse,
};

use crate::error::ReviewError;
use crate::state::{AppState, run_blocking};

/// POST /users/setIsActive
pub async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<SetActiveResponse>, ReviewError> {
    let Json(req) = payload?;

    let user = run_blocking(&state, move |engine| {
        engine.set_user_active(&req.user_id, req.is_active)
    })
    .await?;

    Ok(Json(SetActiveResponse { user: user.into() }))
}

/// GET /users/getReview?user_id= — pull requests the user is reviewing.
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviewsResponse>, ReviewError> {
    let Query(UserQuery { user_id }) = query?;

    let lookup = user_id.clone();
    let reviews = run_blocking(&state, move |engine| engine.user_reviews(&lookup)).await?;

    Ok(Json(UserReviewsResponse {
        user_id,
        pull_requests: reviews.into_iter().map(PullRequestShortDto::from).collect(),
    }))
}
