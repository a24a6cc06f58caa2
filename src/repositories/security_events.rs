use sqlx::PgPool;

use crate::db::models::SecurityEvent;
use crate::db::types::EventSeverity;

const COLUMNS: &str = "\
    id, session_id, event_type, description, severity, occurred_at, metadata, \
    flagged_for_review, auto_resolved, created_at";

pub(crate) struct CreateSecurityEvent<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) event_type: &'a str,
    pub(crate) description: &'a str,
    pub(crate) severity: EventSeverity,
    pub(crate) occurred_at: time::PrimitiveDateTime,
    pub(crate) metadata: serde_json::Value,
    pub(crate) flagged_for_review: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Per-session severity tallies used by the risk classifier.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub(crate) struct SeverityCounts {
    pub(crate) high_count: i64,
    pub(crate) total: i64,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateSecurityEvent<'_>,
) -> Result<SecurityEvent, sqlx::Error> {
    sqlx::query_as::<_, SecurityEvent>(&format!(
        "INSERT INTO security_events (
            id, session_id, event_type, description, severity, occurred_at, metadata,
            flagged_for_review, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.session_id)
    .bind(params.event_type)
    .bind(params.description)
    .bind(params.severity)
    .bind(params.occurred_at)
    .bind(sqlx::types::Json(params.metadata))
    .bind(params.flagged_for_review)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SecurityEvent>, sqlx::Error> {
    sqlx::query_as::<_, SecurityEvent>(&format!(
        "SELECT {COLUMNS} FROM security_events WHERE id = $1",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<SecurityEvent>, sqlx::Error> {
    sqlx::query_as::<_, SecurityEvent>(&format!(
        "SELECT {COLUMNS} FROM security_events
         WHERE session_id = $1
         ORDER BY occurred_at, id",
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn severity_counts(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<SeverityCounts, sqlx::Error> {
    sqlx::query_as::<_, SeverityCounts>(
        "SELECT COUNT(*) FILTER (WHERE severity = $2) AS high_count,
                COUNT(*) AS total
         FROM security_events
         WHERE session_id = $1",
    )
    .bind(session_id)
    .bind(EventSeverity::High)
    .fetch_one(executor)
    .await
}

pub(crate) async fn resolve(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SecurityEvent>, sqlx::Error> {
    sqlx::query_as::<_, SecurityEvent>(&format!(
        "UPDATE security_events
         SET auto_resolved = TRUE, flagged_for_review = FALSE
         WHERE id = $1
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}
