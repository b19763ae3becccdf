//! REST routes for teams, users and pull requests.
//!
//! Handlers only decode the request, call the matching service and wrap the
//! result; all rules live in `crate::services`.

use super::error::ApiErr;
use super::AppState;
use crate::models::{PullRequest, Team, User};
use crate::services::{
    CreatePullRequestInput, CreateTeamInput, MergePullRequestInput, ReassignReviewerInput,
    Reassignment, SetUserActiveInput, UserReviews,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    #[serde(default)]
    pub team_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

// ── Route builder ────────────────────────────────────────────────────────────

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/team/add", post(create_team))
        .route("/team/get", get(get_team))
        .route("/users/setIsActive", post(set_user_active))
        .route("/users/getReview", get(get_user_reviews))
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /team/add: create a team with its members.
async fn create_team(
    State(state): State<AppState>,
    payload: Result<Json<CreateTeamInput>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiErr> {
    let Json(input) = payload?;
    let team = state.teams.create_team(input).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get?team_name=X
async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(query) = query?;
    Ok(Json(state.teams.get_team(&query.team_name).await?))
}

/// POST /users/setIsActive
async fn set_user_active(
    State(state): State<AppState>,
    payload: Result<Json<SetUserActiveInput>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(input) = payload?;
    let user = state.users.set_user_active(input).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview?user_id=X: pull requests the user reviews.
async fn get_user_reviews(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviews>, ApiErr> {
    let Query(query) = query?;
    Ok(Json(state.users.get_user_reviews(&query.user_id).await?))
}

/// POST /pullRequest/create
async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiErr> {
    let Json(input) = payload?;
    let pr = state.pull_requests.create_pull_request(input).await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge (idempotent)
async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestInput>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiErr> {
    let Json(input) = payload?;
    let pr = state.pull_requests.merge_pull_request(input).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign
async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignReviewerInput>, JsonRejection>,
) -> Result<Json<Reassignment>, ApiErr> {
    let Json(input) = payload?;
    Ok(Json(state.pull_requests.reassign_reviewer(input).await?))
}
