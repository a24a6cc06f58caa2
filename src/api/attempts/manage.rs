use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_role, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Attempt;
use crate::db::types::{AssessmentKind, AttemptStatus, EnrollmentRole, EventSeverity};
use crate::repositories;
use crate::schemas::attempt::{
    AttemptReportResponse, AttemptResponse, AttemptSuspend, ResponseDetail,
};
use crate::schemas::security::{SecurityEventResponse, SecuritySessionResponse};
use crate::services::risk;

#[derive(Debug, serde::Deserialize)]
pub(super) struct AttemptPath {
    course_id: String,
    attempt_id: String,
}

/// Abandons an in-progress attempt, closes its session and appends a synthetic
/// high-severity event. Returns `None` when the attempt already left
/// `in_progress`.
pub(crate) async fn suspend_in_progress(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    attempt_id: &str,
    session_id: &str,
    event_type: &str,
    description: &str,
    metadata: serde_json::Value,
    now: time::PrimitiveDateTime,
) -> Result<Option<Attempt>, ApiError> {
    // Session row first, then attempt row. Every writer that touches both
    // takes them in this order.
    repositories::security_sessions::end_session(&mut **tx, session_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close security session"))?;

    let Some(attempt) = repositories::attempts::abandon(&mut **tx, attempt_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to abandon attempt"))?
    else {
        return Ok(None);
    };

    repositories::security_events::create(
        &mut **tx,
        repositories::security_events::CreateSecurityEvent {
            id: &Uuid::new_v4().to_string(),
            session_id,
            event_type,
            description,
            severity: EventSeverity::High,
            occurred_at: now,
            metadata,
            flagged_for_review: true,
            created_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record suspension event"))?;

    Ok(Some(attempt))
}

pub(super) async fn suspend_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<AttemptPath>,
    Json(payload): Json<AttemptSuspend>,
) -> Result<Json<AttemptResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_role(&state, &user, &path.course_id, EnrollmentRole::Instructor).await?;

    let (attempt, assessment) = load_course_attempt(&state, &path.course_id, &path.attempt_id).await?;

    if assessment.kind != AssessmentKind::Exam {
        return Err(ApiError::BadRequest("Only exam attempts can be suspended".to_string()));
    }

    if attempt.status != AttemptStatus::InProgress {
        return Err(ApiError::Conflict("Attempt is not in progress".to_string()));
    }

    let session = repositories::security_sessions::find_by_attempt(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security session"))?
        .ok_or_else(|| ApiError::NotFound("Security session not found".to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let suspended = suspend_in_progress(
        &mut tx,
        &attempt.id,
        &session.id,
        "manual_suspension",
        &payload.reason,
        serde_json::json!({ "reviewer_id": user.id }),
        now,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Attempt is not in progress".to_string()))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        attempt_id = %suspended.id,
        reviewer_id = %user.id,
        "Attempt suspended"
    );

    Ok(Json(AttemptResponse::from_db(suspended)))
}

pub(super) async fn attempt_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<AttemptPath>,
) -> Result<Json<AttemptReportResponse>, ApiError> {
    require_course_role(&state, &user, &path.course_id, EnrollmentRole::Instructor).await?;

    let (attempt, assessment) = load_course_attempt(&state, &path.course_id, &path.attempt_id).await?;

    let responses = repositories::responses::list_by_attempt(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch responses"))?;

    let session = repositories::security_sessions::find_by_attempt(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security session"))?;

    let (events, risk_level, requires_review) = match &session {
        Some(session) => {
            let events = repositories::security_events::list_by_session(state.db(), &session.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch security events"))?;
            let counts = repositories::security_events::severity_counts(state.db(), &session.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count security events"))?;

            let config =
                repositories::exam_configurations::find_by_assessment(state.db(), &assessment.id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch exam configuration"))?;
            let threshold = config
                .as_ref()
                .map(|c| c.alert_threshold as i64)
                .unwrap_or(risk::DEFAULT_ALERT_THRESHOLD);
            let forced = config.map(|c| c.manual_review_required).unwrap_or(false);

            let level = risk::classify(counts.high_count, counts.total);
            let review = forced || risk::requires_review(counts.total, threshold);
            (events, level, review)
        }
        None => (Vec::new(), risk::RiskLevel::Low, false),
    };

    Ok(Json(AttemptReportResponse {
        attempt: AttemptResponse::from_db(attempt),
        responses: responses.into_iter().map(ResponseDetail::from_db).collect(),
        session: session.map(SecuritySessionResponse::from_db),
        security_events: events.into_iter().map(SecurityEventResponse::from_db).collect(),
        risk_level,
        requires_review,
    }))
}

async fn load_course_attempt(
    state: &AppState,
    course_id: &str,
    attempt_id: &str,
) -> Result<(Attempt, crate::db::models::Assessment), ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    let assessment =
        repositories::assessments::find_in_course(state.db(), course_id, &attempt.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
            .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    Ok((attempt, assessment))
}
