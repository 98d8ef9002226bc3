//! Test-run reporting - `/api/test-results`
//!
//! Reporters (CI jobs) write runs, suites and cases with the shared API key.
//! Signed-in users browse and delete them.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::{AuthUser, ReporterKey};
use crate::db::repos::{
    BulkSuite, NewCase, NewRun, RunFilter, SuiteWithCases, TestCase, TestResultRepo, TestRun,
    TestSuite,
};
use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;
use crate::models::{blank_to_none, require_text, PageInfo, Pagination, PaginationParams, Platform};

const DEFAULT_ENVIRONMENT: &str = "local";

#[derive(Deserialize)]
pub struct RunRequest {
    pub platform: Option<String>,
    pub environment: Option<String>,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
}

impl RunRequest {
    fn validate(self) -> Result<NewRun, ApiError> {
        Ok(NewRun {
            platform: Platform::require(self.platform.as_deref())?,
            environment: blank_to_none(self.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            branch: blank_to_none(self.branch),
            commit_hash: blank_to_none(self.commit_hash),
        })
    }
}

#[derive(Deserialize)]
pub struct BulkRunRequest {
    #[serde(flatten)]
    pub run: RunRequest,
    pub suites: Option<Vec<BulkSuite>>,
}

#[derive(Deserialize)]
pub struct SuiteRequest {
    pub name: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Deserialize)]
pub struct CaseRequest {
    pub name: Option<String>,
    pub status: Option<String>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub error_stack: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CompleteSuiteRequest {
    pub duration_ms: Option<i64>,
}

#[derive(Deserialize)]
pub struct RunsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub platform: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct RunResponse {
    pub run: TestRun,
}

#[derive(Serialize)]
pub struct SuiteResponse {
    pub suite: TestSuite,
}

#[derive(Serialize)]
pub struct CaseResponse {
    #[serde(rename = "testCase")]
    pub test_case: TestCase,
}

#[derive(Serialize)]
pub struct RunsResponse {
    pub runs: Vec<TestRun>,
    pub pagination: PageInfo,
}

#[derive(Serialize)]
pub struct RunDetailResponse {
    pub run: TestRun,
    pub suites: Vec<SuiteWithCases>,
}

// ---- reporter endpoints ----

/// POST /api/test-results/runs
async fn create_run(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Json(req): Json<RunRequest>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    let run = TestResultRepo::new(&state.pool)
        .create_run(&req.validate()?)
        .await?;
    tracing::info!(run_id = run.id, platform = %run.platform, "test run started");
    Ok((StatusCode::CREATED, Json(RunResponse { run })))
}

/// POST /api/test-results/runs/{run_id}/suites
async fn create_suite(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Path(run_id): Path<i64>,
    Json(req): Json<SuiteRequest>,
) -> Result<(StatusCode, Json<SuiteResponse>), ApiError> {
    let name = require_text("Suite name", req.name.as_deref())?;
    let file_path = blank_to_none(req.file_path);
    let suite = TestResultRepo::new(&state.pool)
        .create_suite(run_id, &name, file_path.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(SuiteResponse { suite })))
}

/// POST /api/test-results/suites/{suite_id}/cases
async fn create_case(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Path(suite_id): Path<i64>,
    Json(req): Json<CaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    let case = NewCase {
        name: require_text("Test case name", req.name.as_deref())?,
        status: blank_to_none(req.status).unwrap_or_else(|| "pending".to_string()),
        duration_ms: req.duration_ms,
        error_message: req.error_message,
        error_stack: req.error_stack,
    };
    let test_case = TestResultRepo::new(&state.pool)
        .create_case(suite_id, &case)
        .await?;
    Ok((StatusCode::CREATED, Json(CaseResponse { test_case })))
}

/// PUT /api/test-results/suites/{suite_id}/complete
async fn complete_suite(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Path(suite_id): Path<i64>,
    body: Option<Json<CompleteSuiteRequest>>,
) -> Result<Json<SuiteResponse>, ApiError> {
    let Json(req) = body.unwrap_or_default();
    let suite = TestResultRepo::new(&state.pool)
        .complete_suite(suite_id, req.duration_ms)
        .await?;
    Ok(Json(SuiteResponse { suite }))
}

/// PUT /api/test-results/runs/{run_id}/complete
async fn complete_run(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Path(run_id): Path<i64>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = TestResultRepo::new(&state.pool).complete_run(run_id).await?;
    tracing::info!(
        run_id,
        status = %run.status,
        total = run.total_tests,
        failed = run.failed_tests,
        "test run completed"
    );
    Ok(Json(RunResponse { run }))
}

/// POST /api/test-results/runs/bulk
async fn create_bulk(
    State(state): State<Arc<AppState>>,
    _key: ReporterKey,
    Json(req): Json<BulkRunRequest>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    let run = req.run.validate()?;
    let suites = req
        .suites
        .ok_or_else(|| ApiError::bad_request("Suites array is required"))?;

    let run = TestResultRepo::new(&state.pool)
        .create_bulk(&run, &suites)
        .await?;
    Ok((StatusCode::CREATED, Json(RunResponse { run })))
}

// ---- admin endpoints ----

/// GET /api/test-results/runs?page&limit&platform&status
async fn list_runs(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Query(query): Query<RunsQuery>,
) -> Result<Json<RunsResponse>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: query.page,
        limit: query.limit,
    });
    let filter = RunFilter {
        platform: blank_to_none(query.platform),
        status: blank_to_none(query.status),
    };

    let (runs, total) = TestResultRepo::new(&state.pool)
        .list_runs(&filter, page)
        .await?;

    Ok(Json(RunsResponse {
        runs,
        pagination: PageInfo::new(page, total),
    }))
}

/// GET /api/test-results/runs/{run_id}
async fn get_run(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Path(run_id): Path<i64>,
) -> Result<Json<RunDetailResponse>, ApiError> {
    let repo = TestResultRepo::new(&state.pool);
    let run = repo.get_run(run_id).await?;
    let suites = repo.suites_with_cases(run_id).await?;
    Ok(Json(RunDetailResponse { run, suites }))
}

/// DELETE /api/test-results/runs/{run_id}
async fn delete_run(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(run_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !TestResultRepo::new(&state.pool).delete_run(run_id).await? {
        return Err(ApiError::not_found("Test run not found"));
    }
    tracing::info!(run_id, user_id = user.id, "test run deleted");
    Ok(MessageResponse::new("Test run deleted successfully"))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/runs", get(list_runs).post(create_run))
        .route("/runs/bulk", post(create_bulk))
        .route("/runs/{id}", get(get_run).delete(delete_run))
        .route("/runs/{id}/suites", post(create_suite))
        .route("/runs/{id}/complete", put(complete_run))
        .route("/suites/{id}/cases", post(create_case))
        .route("/suites/{id}/complete", put(complete_suite))
}
