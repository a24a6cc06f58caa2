use sqlx::PgPool;

use crate::db::models::SecuritySession;

const COLUMNS: &str = "\
    id, attempt_id, token_hash, ip_address, user_agent, screen_resolution, timezone, \
    proctoring_enabled, webcam_required, lockdown_browser, started_at, ended_at";

pub(crate) struct CreateSecuritySession<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) token_hash: &'a str,
    pub(crate) ip_address: Option<&'a str>,
    pub(crate) user_agent: Option<&'a str>,
    pub(crate) screen_resolution: Option<&'a str>,
    pub(crate) timezone: Option<&'a str>,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) started_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSecuritySession<'_>,
) -> Result<SecuritySession, sqlx::Error> {
    sqlx::query_as::<_, SecuritySession>(&format!(
        "INSERT INTO security_sessions (
            id, attempt_id, token_hash, ip_address, user_agent, screen_resolution,
            timezone, proctoring_enabled, webcam_required, lockdown_browser, started_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.token_hash)
    .bind(params.ip_address)
    .bind(params.user_agent)
    .bind(params.screen_resolution)
    .bind(params.timezone)
    .bind(params.proctoring_enabled)
    .bind(params.webcam_required)
    .bind(params.lockdown_browser)
    .bind(params.started_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SecuritySession>, sqlx::Error> {
    sqlx::query_as::<_, SecuritySession>(&format!(
        "SELECT {COLUMNS} FROM security_sessions WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_attempt(
    executor: impl sqlx::PgExecutor<'_>,
    attempt_id: &str,
) -> Result<Option<SecuritySession>, sqlx::Error> {
    sqlx::query_as::<_, SecuritySession>(&format!(
        "SELECT {COLUMNS} FROM security_sessions WHERE attempt_id = $1",
    ))
    .bind(attempt_id)
    .fetch_optional(executor)
    .await
}

/// Row-locks the session so the ended_at check holds for the rest of the
/// transaction. Concurrent closers queue on the lock.
pub(crate) async fn lock(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<Option<SecuritySession>, sqlx::Error> {
    sqlx::query_as::<_, SecuritySession>(&format!(
        "SELECT {COLUMNS} FROM security_sessions WHERE id = $1 FOR UPDATE",
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Closes the session if still open. Idempotent.
pub(crate) async fn end_session(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    ended_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE security_sessions SET ended_at = $1 WHERE id = $2 AND ended_at IS NULL")
            .bind(ended_at)
            .bind(id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected() > 0)
}
