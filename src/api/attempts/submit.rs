use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::EnrollmentStatus;
use crate::repositories;
use crate::schemas::attempt::{
    AttemptResponse, AttemptSubmit, AttemptSubmitResponse, ResponseDetail,
};
use crate::services::scoring::{self, SubmittedResponse};

#[derive(Debug, serde::Deserialize)]
pub(super) struct SubmitPath {
    course_id: String,
    assessment_id: String,
}

pub(super) async fn submit_attempt(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<SubmitPath>,
    Json(payload): Json<AttemptSubmit>,
) -> Result<Json<AttemptSubmitResponse>, ApiError> {
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

    let attempt = repositories::attempts::find_in_progress(state.db(), &assessment.id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    let questions = repositories::questions::list_by_assessment(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let answers = repositories::questions::list_answers_by_assessment(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let submitted: Vec<SubmittedResponse> = payload
        .responses
        .into_iter()
        .map(|response| SubmittedResponse {
            question_id: response.question_id,
            answer_id: response.answer_id,
            response_text: response.response_text,
        })
        .collect();

    let outcome =
        scoring::score_submission(&questions, &answers, assessment.passing_score, &submitted);
    // The question set may have been edited while the attempt was open, so the
    // stored maximum is refreshed from the set actually scored against.
    let max_score = scoring::max_score(&questions);

    for question_id in &outcome.skipped_question_ids {
        tracing::warn!(
            attempt_id = %attempt.id,
            question_id = %question_id,
            "Skipping response for unknown or duplicate question"
        );
    }

    let now = primitive_now_utc();
    let time_spent = (now.assume_utc() - attempt.started_at.assume_utc()).whole_seconds().max(0);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Session row first, then attempt row. Every writer that touches both
    // takes them in this order.
    if let Some(session) = repositories::security_sessions::find_by_attempt(&mut *tx, &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch security session"))?
    {
        repositories::security_sessions::end_session(&mut *tx, &session.id, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to close security session"))?;
    }

    // The row lock serializes concurrent submissions of the same attempt. The
    // loser blocks here, then sees the completed status and gets a 404 instead
    // of tripping the unique constraint on responses.
    repositories::attempts::lock_in_progress(&mut *tx, &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to lock attempt"))?
        .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    let mut details = Vec::new();
    for scored in &outcome.responses {
        let row = repositories::responses::create(
            &mut *tx,
            repositories::responses::CreateResponse {
                id: &Uuid::new_v4().to_string(),
                attempt_id: &attempt.id,
                question_id: &scored.question_id,
                answer_id: scored.answer_id.as_deref(),
                response_text: scored.response_text.as_deref(),
                is_correct: scored.is_correct,
                points_earned: scored.points_earned,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record response"))?;
        details.push(ResponseDetail::from_db(row));
    }

    let completed = repositories::attempts::complete(
        &mut *tx,
        &attempt.id,
        outcome.final_score,
        max_score,
        outcome.passed,
        now,
        time_spent,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to complete attempt"))?
    .ok_or_else(|| ApiError::NotFound("No active attempt".to_string()))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        attempt_id = %completed.id,
        score = outcome.final_score,
        passed = outcome.passed,
        "Attempt submitted"
    );

    Ok(Json(AttemptSubmitResponse {
        attempt: AttemptResponse::from_db(completed),
        responses: details,
        skipped_question_ids: outcome.skipped_question_ids,
    }))
}
