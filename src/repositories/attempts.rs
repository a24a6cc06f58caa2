use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::Attempt;
use crate::db::types::AttemptStatus;

const COLUMNS: &str = "\
    id, assessment_id, user_id, enrollment_id, attempt_number, started_at, ended_at, \
    status, score, max_score, passed, time_spent_seconds, created_at, updated_at";

pub(crate) struct CreateAttempt<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) enrollment_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) max_score: f64,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Row shape used by assessment reporting: completed attempts joined with the
/// number of security events recorded against each one.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CompletedAttemptRow {
    pub(crate) user_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) score: Option<f64>,
    pub(crate) passed: Option<bool>,
    pub(crate) security_event_count: i64,
}

/// Serializes concurrent attempt creation for one (assessment, user) pair.
/// Released automatically at transaction end.
pub(crate) async fn acquire_assessment_user_lock(
    tx: &mut Transaction<'_, Postgres>,
    assessment_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(format!("attempt:{assessment_id}:{user_id}"))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub(crate) async fn count_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE assessment_id = $1 AND user_id = $2")
        .bind(assessment_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

/// Serializes the capacity check across all attempt starts. Released
/// automatically at transaction end.
pub(crate) async fn acquire_global_lock(
    tx: &mut Transaction<'_, Postgres>,
    key: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(key)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Attempts older than the cutoff are treated as walked away from and do not
/// count against server capacity.
pub(crate) async fn count_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    started_after: time::PrimitiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE status = $1 AND started_at > $2")
        .bind(AttemptStatus::InProgress)
        .bind(started_after)
        .fetch_one(executor)
        .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAttempt<'_>,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "INSERT INTO attempts (
            id, assessment_id, user_id, enrollment_id, attempt_number, started_at,
            status, max_score, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        ON CONFLICT (assessment_id, user_id, attempt_number) DO NOTHING
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.user_id)
    .bind(params.enrollment_id)
    .bind(params.attempt_number)
    .bind(params.started_at)
    .bind(AttemptStatus::InProgress)
    .bind(params.max_score)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!("SELECT {COLUMNS} FROM attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
    user_id: &str,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM attempts
         WHERE assessment_id = $1 AND user_id = $2 AND status = $3",
    ))
    .bind(assessment_id)
    .bind(user_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

/// Row-locks an attempt that is still in progress. Concurrent submissions
/// queue on the lock and see the updated status once the winner commits.
pub(crate) async fn lock_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "SELECT {COLUMNS} FROM attempts WHERE id = $1 AND status = $2 FOR UPDATE",
    ))
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: f64,
    max_score: f64,
    passed: bool,
    ended_at: time::PrimitiveDateTime,
    time_spent_seconds: i64,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "UPDATE attempts
         SET status = $1, score = $2, max_score = $3, passed = $4, ended_at = $5,
             time_spent_seconds = $6, updated_at = $5
         WHERE id = $7 AND status = $8
         RETURNING {COLUMNS}",
    ))
    .bind(AttemptStatus::Completed)
    .bind(score)
    .bind(max_score)
    .bind(passed)
    .bind(ended_at)
    .bind(time_spent_seconds)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn abandon(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    ended_at: time::PrimitiveDateTime,
) -> Result<Option<Attempt>, sqlx::Error> {
    sqlx::query_as::<_, Attempt>(&format!(
        "UPDATE attempts
         SET status = $1, ended_at = $2, updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING {COLUMNS}",
    ))
    .bind(AttemptStatus::Abandoned)
    .bind(ended_at)
    .bind(id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_completed_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<CompletedAttemptRow>, sqlx::Error> {
    sqlx::query_as::<_, CompletedAttemptRow>(
        "SELECT a.user_id, a.attempt_number, a.score, a.passed,
                COUNT(e.id) AS security_event_count
         FROM attempts a
         LEFT JOIN security_sessions s ON s.attempt_id = a.id
         LEFT JOIN security_events e ON e.session_id = s.id
         WHERE a.assessment_id = $1 AND a.status = $2
         GROUP BY a.id
         ORDER BY a.user_id, a.attempt_number",
    )
    .bind(assessment_id)
    .bind(AttemptStatus::Completed)
    .fetch_all(pool)
    .await
}
