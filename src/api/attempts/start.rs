use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::core::security;
use crate::db::models::ExamConfiguration;
use crate::db::types::{AssessmentKind, EnrollmentStatus};
use crate::repositories;
use crate::schemas::attempt::{
    AttemptResponse, AttemptStart, AttemptStartResponse, SecurityConfigSummary,
};
use crate::services::scoring;

#[derive(Debug, serde::Deserialize)]
pub(super) struct StartPath {
    course_id: String,
    assessment_id: String,
}

pub(super) async fn start_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<StartPath>,
    headers: HeaderMap,
    payload: Option<Json<AttemptStart>>,
) -> Result<(StatusCode, Json<AttemptStartResponse>), ApiError> {
    let Json(client) = payload.unwrap_or_default();

    let enrollment =
        repositories::enrollments::find_for_user_course(state.db(), &user.id, &path.course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
            .filter(|enrollment| enrollment.status == EnrollmentStatus::Active)
            .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    let assessment =
        repositories::assessments::find_in_course(state.db(), &path.course_id, &path.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
            .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;

    let config = match assessment.kind {
        AssessmentKind::Exam => {
            repositories::exam_configurations::find_by_assessment(state.db(), &assessment.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch exam configuration"))?
        }
        AssessmentKind::Quiz => None,
    };

    let allowed_attempts = match assessment.kind {
        AssessmentKind::Exam => config.as_ref().map(|c| c.allowed_attempts).unwrap_or(1),
        AssessmentKind::Quiz => assessment.attempts_allowed,
    };

    let questions = repositories::questions::list_by_assessment(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let max_score = scoring::max_score(&questions);

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // The global lock serializes the capacity check across all starts so
    // concurrent requests cannot overshoot the limit. Attempts that outlived
    // the stale window are walked-away-from and do not hold a slot.
    repositories::attempts::acquire_global_lock(&mut tx, "attempts_active_capacity")
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire capacity lock"))?;

    let proctoring = state.settings().proctoring();
    let cutoff = now - time::Duration::minutes(proctoring.stale_attempt_minutes as i64);
    let active = repositories::attempts::count_in_progress(&mut *tx, cutoff)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count active attempts"))?;
    if active >= proctoring.max_active_attempts as i64 {
        return Err(ApiError::TooManyRequests("Server is at capacity, try again later"));
    }

    // The lock serializes the count-then-insert against concurrent starts for
    // the same (assessment, user); the unique attempt_number is the backstop.
    repositories::attempts::acquire_assessment_user_lock(&mut tx, &assessment.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to acquire attempt lock"))?;

    let prior = repositories::attempts::count_for_user(&mut *tx, &assessment.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;

    if prior >= allowed_attempts as i64 {
        return Err(ApiError::Forbidden("Maximum number of attempts reached"));
    }

    let attempt_id = Uuid::new_v4().to_string();
    let attempt = repositories::attempts::create(
        &mut *tx,
        repositories::attempts::CreateAttempt {
            id: &attempt_id,
            assessment_id: &assessment.id,
            user_id: &user.id,
            enrollment_id: &enrollment.id,
            attempt_number: (prior + 1) as i32,
            started_at: now,
            max_score,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create attempt"))?
    .ok_or_else(|| ApiError::Conflict("An attempt is already being created".to_string()))?;

    let (session_id, session_token, security_config) = match assessment.kind {
        AssessmentKind::Exam => {
            let token = security::generate_session_token();
            let session = create_security_session(
                &mut tx,
                &attempt_id,
                &token,
                config.as_ref(),
                &headers,
                &client,
                now,
            )
            .await?;
            let summary = SecurityConfigSummary {
                proctoring_enabled: session.proctoring_enabled,
                webcam_required: session.webcam_required,
                lockdown_browser: session.lockdown_browser,
            };
            (Some(session.id), Some(token), Some(summary))
        }
        AssessmentKind::Quiz => (None, None, None),
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        attempt_id = %attempt.id,
        assessment_id = %assessment.id,
        attempt_number = attempt.attempt_number,
        "Attempt started"
    );

    Ok((
        StatusCode::CREATED,
        Json(AttemptStartResponse {
            attempt: AttemptResponse::from_db(attempt),
            session_id,
            session_token,
            security_config,
        }),
    ))
}

async fn create_security_session(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    attempt_id: &str,
    token: &str,
    config: Option<&ExamConfiguration>,
    headers: &HeaderMap,
    client: &AttemptStart,
    now: time::PrimitiveDateTime,
) -> Result<crate::db::models::SecuritySession, ApiError> {
    let token_hash = security::hash_session_token(token);
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim);
    let user_agent = headers.get(axum::http::header::USER_AGENT).and_then(|v| v.to_str().ok());

    repositories::security_sessions::create(
        &mut **tx,
        repositories::security_sessions::CreateSecuritySession {
            id: &Uuid::new_v4().to_string(),
            attempt_id,
            token_hash: &token_hash,
            ip_address,
            user_agent,
            screen_resolution: client.screen_resolution.as_deref(),
            timezone: client.timezone.as_deref(),
            proctoring_enabled: config.map(|c| c.proctoring_enabled).unwrap_or(false),
            webcam_required: config.map(|c| c.webcam_required).unwrap_or(false),
            lockdown_browser: config.map(|c| c.lockdown_browser).unwrap_or(false),
            started_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create security session"))
}
