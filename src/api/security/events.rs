use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::attempts::suspend_in_progress;
use crate::api::errors::ApiError;
use crate::api::guards::{require_course_role, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Attempt, SecuritySession};
use crate::db::types::{AttemptStatus, EnrollmentRole, EventSeverity};
use crate::repositories;
use crate::schemas::security::{SecurityEventCreate, SecurityEventRecorded, SecurityEventResponse};

pub(super) async fn record_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
    Json(payload): Json<SecurityEventCreate>,
) -> Result<(StatusCode, Json<SecurityEventRecorded>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (session, attempt) = load_session(&state, &session_id).await?;

    if attempt.user_id != user.id {
        return Err(ApiError::Forbidden("Session belongs to another user"));
    }

    if session.ended_at.is_some() {
        return Err(ApiError::Conflict("Security session has ended".to_string()));
    }

    let proctoring = state.settings().proctoring();
    let rate_key = format!("rl:events:{session_id}");
    let allowed = state
        .redis()
        .rate_limit(&rate_key, proctoring.event_rate_limit, proctoring.event_rate_window_seconds)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Too many security events, slow down"));
    }

    let config =
        repositories::exam_configurations::find_by_assessment(state.db(), &attempt.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam configuration"))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Re-check under the row lock: a concurrent submission may have closed
    // the session after the read above.
    let locked = repositories::security_sessions::lock(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock security session"))?
        .ok_or_else(|| ApiError::NotFound("Security session not found".to_string()))?;
    if locked.ended_at.is_some() {
        return Err(ApiError::Conflict("Security session has ended".to_string()));
    }

    let event = repositories::security_events::create(
        &mut *tx,
        repositories::security_events::CreateSecurityEvent {
            id: &Uuid::new_v4().to_string(),
            session_id: &session.id,
            event_type: &payload.event_type,
            description: &payload.description,
            severity: payload.severity,
            occurred_at: now,
            metadata: payload.metadata,
            flagged_for_review: payload.severity == EventSeverity::High,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record security event"))?;

    let mut attempt_suspended = false;
    if let Some(config) = config {
        if config.auto_suspend && attempt.status == AttemptStatus::InProgress {
            let counts = repositories::security_events::severity_counts(&mut *tx, &session.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count security events"))?;

            if counts.total > config.alert_threshold as i64 {
                attempt_suspended = suspend_in_progress(
                    &mut tx,
                    &attempt.id,
                    &session.id,
                    "auto_suspension",
                    "Security event count exceeded the alert threshold",
                    serde_json::json!({
                        "alert_threshold": config.alert_threshold,
                        "event_count": counts.total,
                    }),
                    now,
                )
                .await?
                .is_some();
            }
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    if attempt_suspended {
        tracing::warn!(
            attempt_id = %attempt.id,
            session_id = %session.id,
            "Attempt auto-suspended after exceeding the alert threshold"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(SecurityEventRecorded {
            event: SecurityEventResponse::from_db(event),
            attempt_suspended,
        }),
    ))
}

pub(super) async fn list_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<SecurityEventResponse>>, ApiError> {
    let (session, attempt) = load_session(&state, &session_id).await?;

    if attempt.user_id != user.id {
        let course_id = course_id_for_assessment(&state, &attempt.assessment_id).await?;
        require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;
    }

    let events = repositories::security_events::list_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security events"))?;

    Ok(Json(events.into_iter().map(SecurityEventResponse::from_db).collect()))
}

pub(super) async fn resolve_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<SecurityEventResponse>, ApiError> {
    let event = repositories::security_events::find_by_id(state.db(), &event_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security event"))?
        .ok_or_else(|| ApiError::NotFound("Security event not found".to_string()))?;

    let (_, attempt) = load_session(&state, &event.session_id).await?;
    let course_id = course_id_for_assessment(&state, &attempt.assessment_id).await?;
    require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;

    let resolved = repositories::security_events::resolve(state.db(), &event.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve security event"))?
        .ok_or_else(|| ApiError::NotFound("Security event not found".to_string()))?;

    tracing::info!(event_id = %resolved.id, reviewer_id = %user.id, "Security event resolved");

    Ok(Json(SecurityEventResponse::from_db(resolved)))
}

async fn load_session(
    state: &AppState,
    session_id: &str,
) -> Result<(SecuritySession, Attempt), ApiError> {
    let session = repositories::security_sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security session"))?
        .ok_or_else(|| ApiError::NotFound("Security session not found".to_string()))?;

    let attempt = repositories::attempts::find_by_id(state.db(), &session.attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    Ok((session, attempt))
}

async fn course_id_for_assessment(state: &AppState, assessment_id: &str) -> Result<String, ApiError> {
    repositories::assessments::course_id_of(state.db(), assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve course"))?
        .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))
}
