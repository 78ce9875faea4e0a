use axum::{
    Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};

use review_types::api::{CreateTeamResponse, TeamDto, TeamQuery};

use crate::error::ReviewError;
use crate::state::{AppState, run_blocking};

/// POST /team/add — create a team and upsert its members.
pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<TeamDto>, JsonRejection>,
) -> Result<impl IntoResponse, ReviewError> {
    let Json(req) = payload?;

    let team = run_blocking(&state, move |engine| engine.create_team(req.into())).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTeamResponse { team: team.into() }),
    ))
}

/// GET /team/get?team_name=
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<TeamDto>, ReviewError> {
    let Query(query) = query?;

    let team = run_blocking(&state, move |engine| engine.get_team(&query.team_name)).await?;
    Ok(Json(team.into()))
}
