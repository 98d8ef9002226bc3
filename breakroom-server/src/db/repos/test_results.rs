//! Test-run repository
//!
//! Runs own suites, suites own cases (cascading deletes). Counts and
//! statuses are derived from case statuses with [`Tally`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::DbError;
use crate::models::{Pagination, Platform, Tally};

const RUN_COLUMNS: &str = "id, platform, environment, branch, commit_hash, started_at, ended_at, \
     total_tests, passed_tests, failed_tests, skipped_tests, status, created_at";

const SUITE_COLUMNS: &str = "id, test_run_id, name, file_path, category, started_at, ended_at, \
     duration_ms, total_tests, passed_tests, failed_tests, skipped_tests, status";

const CASE_COLUMNS: &str = "id, test_suite_id, name, status, duration_ms, started_at, ended_at, \
     error_message, error_stack";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestRun {
    pub id: i64,
    pub platform: String,
    pub environment: String,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub failed_tests: i32,
    pub skipped_tests: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestSuite {
    pub id: i64,
    pub test_run_id: i64,
    pub name: String,
    pub file_path: Option<String>,
    pub category: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub total_tests: i32,
    pub passed_tests: i32,
    pub failed_tests: i32,
    pub skipped_tests: i32,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestCase {
    pub id: i64,
    pub test_suite_id: i64,
    pub name: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub error_stack: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteWithCases {
    #[serde(flatten)]
    pub suite: TestSuite,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone)]
pub struct NewRun {
    pub platform: Platform,
    pub environment: String,
    pub branch: Option<String>,
    pub commit_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCase {
    pub name: String,
    #[serde(default = "pending")]
    pub status: String,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub error_stack: Option<String>,
}

fn pending() -> String {
    "pending".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkSuite {
    pub name: String,
    pub file_path: Option<String>,
    pub category: Option<String>,
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub tests: Vec<NewCase>,
}

/// Optional filters for listing runs
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub platform: Option<String>,
    pub status: Option<String>,
}

pub struct TestResultRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TestResultRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Start a run in `running` state.
    pub async fn create_run(&self, run: &NewRun) -> Result<TestRun, DbError> {
        let sql = format!(
            r#"
            INSERT INTO test_runs (platform, environment, branch, commit_hash, started_at, status)
            VALUES ($1, $2, $3, $4, NOW(), 'running')
            RETURNING {RUN_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TestRun>(&sql)
            .bind(run.platform.as_str())
            .bind(&run.environment)
            .bind(&run.branch)
            .bind(&run.commit_hash)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// Start a suite under a run; an unknown run is `NotFound`.
    pub async fn create_suite(
        &self,
        run_id: i64,
        name: &str,
        file_path: Option<&str>,
    ) -> Result<TestSuite, DbError> {
        let sql = format!(
            r#"
            INSERT INTO test_suites (test_run_id, name, file_path, started_at, status)
            VALUES ($1, $2, $3, NOW(), 'running')
            RETURNING {SUITE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TestSuite>(&sql)
            .bind(run_id)
            .bind(name)
            .bind(file_path)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::from(e).on_foreign_key("test run", run_id))
    }

    /// Record a case under a suite; an unknown suite is `NotFound`.
    pub async fn create_case(&self, suite_id: i64, case: &NewCase) -> Result<TestCase, DbError> {
        let sql = format!(
            r#"
            INSERT INTO test_cases (test_suite_id, name, status, duration_ms, started_at,
                                    ended_at, error_message, error_stack)
            VALUES ($1, $2, $3, $4, NOW(), NOW(), $5, $6)
            RETURNING {CASE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TestCase>(&sql)
            .bind(suite_id)
            .bind(&case.name)
            .bind(&case.status)
            .bind(case.duration_ms)
            .bind(&case.error_message)
            .bind(&case.error_stack)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::from(e).on_foreign_key("test suite", suite_id))
    }

    /// Close a suite: tally its cases and set `passed` or `failed`.
    pub async fn complete_suite(
        &self,
        suite_id: i64,
        duration_ms: Option<i64>,
    ) -> Result<TestSuite, DbError> {
        let statuses: Vec<(String,)> =
            sqlx::query_as("SELECT status FROM test_cases WHERE test_suite_id = $1")
                .bind(suite_id)
                .fetch_all(self.pool)
                .await?;
        let tally = Tally::from_statuses(statuses.iter().map(|(s,)| s.as_str()));

        let sql = format!(
            r#"
            UPDATE test_suites
            SET ended_at = NOW(), duration_ms = $1, status = $2,
                total_tests = $3, passed_tests = $4, failed_tests = $5, skipped_tests = $6
            WHERE id = $7
            RETURNING {SUITE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TestSuite>(&sql)
            .bind(duration_ms)
            .bind(tally.suite_status())
            .bind(tally.total)
            .bind(tally.passed)
            .bind(tally.failed)
            .bind(tally.skipped)
            .bind(suite_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("test suite", suite_id))
    }

    /// Close a run: tally every case of every suite, `completed` or `failed`.
    pub async fn complete_run(&self, run_id: i64) -> Result<TestRun, DbError> {
        let statuses: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT tc.status
            FROM test_cases tc
            JOIN test_suites ts ON ts.id = tc.test_suite_id
            WHERE ts.test_run_id = $1
            "#,
        )
        .bind(run_id)
        .fetch_all(self.pool)
        .await?;
        let tally = Tally::from_statuses(statuses.iter().map(|(s,)| s.as_str()));

        let sql = format!(
            r#"
            UPDATE test_runs
            SET ended_at = NOW(), status = $1,
                total_tests = $2, passed_tests = $3, failed_tests = $4, skipped_tests = $5
            WHERE id = $6
            RETURNING {RUN_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TestRun>(&sql)
            .bind(tally.run_status())
            .bind(tally.total)
            .bind(tally.passed)
            .bind(tally.failed)
            .bind(tally.skipped)
            .bind(run_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("test run", run_id))
    }

    /// Insert a finished run with all suites and cases atomically.
    pub async fn create_bulk(&self, run: &NewRun, suites: &[BulkSuite]) -> Result<TestRun, DbError> {
        let run_tally = Tally::from_statuses(
            suites
                .iter()
                .flat_map(|s| s.tests.iter().map(|t| t.status.as_str())),
        );

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO test_runs (platform, environment, branch, commit_hash, started_at, ended_at,
                                   total_tests, passed_tests, failed_tests, skipped_tests, status)
            VALUES ($1, $2, $3, $4, NOW(), NOW(), $5, $6, $7, $8, $9)
            RETURNING {RUN_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, TestRun>(&sql)
            .bind(run.platform.as_str())
            .bind(&run.environment)
            .bind(&run.branch)
            .bind(&run.commit_hash)
            .bind(run_tally.total)
            .bind(run_tally.passed)
            .bind(run_tally.failed)
            .bind(run_tally.skipped)
            .bind(run_tally.run_status())
            .fetch_one(&mut *tx)
            .await?;

        for suite in suites {
            insert_bulk_suite(&mut tx, created.id, suite).await?;
        }

        tx.commit().await?;
        tracing::info!(
            run_id = created.id,
            suites = suites.len(),
            total = run_tally.total,
            status = run_tally.run_status(),
            "bulk test run stored"
        );
        Ok(created)
    }

    /// Runs newest first, with the total matching the filters.
    pub async fn list_runs(
        &self,
        filter: &RunFilter,
        page: Pagination,
    ) -> Result<(Vec<TestRun>, i64), DbError> {
        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM test_runs
            WHERE ($1::TEXT IS NULL OR platform = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(&filter.platform)
        .bind(&filter.status)
        .fetch_one(self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {RUN_COLUMNS} FROM test_runs
            WHERE ($1::TEXT IS NULL OR platform = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let runs = sqlx::query_as::<_, TestRun>(&sql)
            .bind(&filter.platform)
            .bind(&filter.status)
            .bind(page.limit as i64)
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((runs, total))
    }

    pub async fn get_run(&self, run_id: i64) -> Result<TestRun, DbError> {
        let sql = format!("SELECT {RUN_COLUMNS} FROM test_runs WHERE id = $1");
        sqlx::query_as::<_, TestRun>(&sql)
            .bind(run_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("test run", run_id))
    }

    /// Suites of a run in id order, each with its cases. Two queries total.
    pub async fn suites_with_cases(&self, run_id: i64) -> Result<Vec<SuiteWithCases>, DbError> {
        let sql = format!("SELECT {SUITE_COLUMNS} FROM test_suites WHERE test_run_id = $1 ORDER BY id");
        let suites = sqlx::query_as::<_, TestSuite>(&sql)
            .bind(run_id)
            .fetch_all(self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS} FROM test_cases
            WHERE test_suite_id IN (SELECT id FROM test_suites WHERE test_run_id = $1)
            ORDER BY id
            "#
        );
        let cases = sqlx::query_as::<_, TestCase>(&sql)
            .bind(run_id)
            .fetch_all(self.pool)
            .await?;

        Ok(group_cases(suites, cases))
    }

    pub async fn delete_run(&self, run_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM test_runs WHERE id = $1")
            .bind(run_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_bulk_suite(
    tx: &mut Transaction<'_, Postgres>,
    run_id: i64,
    suite: &BulkSuite,
) -> Result<(), DbError> {
    let tally = Tally::from_statuses(suite.tests.iter().map(|t| t.status.as_str()));

    let (suite_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO test_suites (test_run_id, name, file_path, category, started_at, ended_at,
                                 duration_ms, total_tests, passed_tests, failed_tests,
                                 skipped_tests, status)
        VALUES ($1, $2, $3, $4, NOW(), NOW(), $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(run_id)
    .bind(&suite.name)
    .bind(&suite.file_path)
    .bind(&suite.category)
    .bind(suite.duration_ms)
    .bind(tally.total)
    .bind(tally.passed)
    .bind(tally.failed)
    .bind(tally.skipped)
    .bind(tally.suite_status())
    .fetch_one(&mut **tx)
    .await?;

    for case in &suite.tests {
        sqlx::query(
            r#"
            INSERT INTO test_cases (test_suite_id, name, status, duration_ms, started_at,
                                    ended_at, error_message, error_stack)
            VALUES ($1, $2, $3, $4, NOW(), NOW(), $5, $6)
            "#,
        )
        .bind(suite_id)
        .bind(&case.name)
        .bind(&case.status)
        .bind(case.duration_ms)
        .bind(&case.error_message)
        .bind(&case.error_stack)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Attach cases to their suites, preserving suite order.
fn group_cases(suites: Vec<TestSuite>, cases: Vec<TestCase>) -> Vec<SuiteWithCases> {
    let mut by_suite: HashMap<i64, Vec<TestCase>> = HashMap::new();
    for case in cases {
        by_suite.entry(case.test_suite_id).or_default().push(case);
    }

    suites
        .into_iter()
        .map(|suite| SuiteWithCases {
            cases: by_suite.remove(&suite.id).unwrap_or_default(),
            suite,
        })
        .collect()
}
