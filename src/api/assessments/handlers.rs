use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_access, require_course_role, CurrentUser};
use crate::api::validation::{validate_assessment_shape, validate_question_set};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{AssessmentKind, EnrollmentRole};
use crate::repositories;
use crate::schemas::assessment::{AssessmentCreate, AssessmentResponse, AssessmentUpdate};

use super::helpers;

#[derive(Debug, serde::Deserialize)]
pub(super) struct CreatePath {
    course_id: String,
}

#[derive(Debug, serde::Deserialize)]
pub(super) struct AssessmentPath {
    course_id: String,
    assessment_id: String,
}

#[derive(Debug, serde::Deserialize)]
pub(super) struct AssessmentCreateBody {
    #[serde(alias = "moduleId")]
    module_id: String,
    #[serde(flatten)]
    assessment: AssessmentCreate,
}

pub(super) async fn create_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<CreatePath>,
    Json(payload): Json<AssessmentCreateBody>,
) -> Result<(StatusCode, Json<AssessmentResponse>), ApiError> {
    require_course_role(&state, &user, &path.course_id, EnrollmentRole::Instructor).await?;

    let body = payload.assessment;
    body.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_assessment_shape(body.kind, body.time_limit_minutes)?;
    validate_question_set(&body.questions)?;

    if body.kind == AssessmentKind::Quiz && body.exam_configuration.is_some() {
        return Err(ApiError::BadRequest(
            "Exam configuration is only valid for exams".to_string(),
        ));
    }

    let module =
        repositories::course_modules::find_in_course(state.db(), &path.course_id, &payload.module_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch module"))?
            .ok_or_else(|| ApiError::NotFound("Module not found".to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let assessment_id = Uuid::new_v4().to_string();
    let assessment = repositories::assessments::create(
        &mut *tx,
        repositories::assessments::CreateAssessment {
            id: &assessment_id,
            module_id: &module.id,
            kind: body.kind,
            title: &body.title,
            description: body.description.as_deref(),
            passing_score: body.passing_score,
            shuffle_questions: body.shuffle_questions,
            show_results: body.show_results,
            time_limit_minutes: body.time_limit_minutes,
            attempts_allowed: body.attempts_allowed,
            generates_certificate: body.generates_certificate,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assessment"))?;

    let questions = helpers::insert_question_set(&mut tx, &assessment_id, body.questions).await?;

    let config = match body.exam_configuration {
        Some(ref config) => {
            Some(helpers::create_exam_configuration(&mut tx, &assessment_id, config).await?)
        }
        None => None,
    };

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok((StatusCode::CREATED, Json(AssessmentResponse::from_db(assessment, questions, config))))
}

pub(super) async fn list_assessments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<CreatePath>,
) -> Result<Json<Vec<AssessmentResponse>>, ApiError> {
    require_course_access(&state, &user, &path.course_id).await?;

    let assessments = repositories::assessments::list_by_course(state.db(), &path.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assessments"))?;

    let mut responses = Vec::new();
    for assessment in assessments {
        responses.push(helpers::assessment_detail(&state, assessment).await?);
    }

    Ok(Json(responses))
}

pub(super) async fn get_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<AssessmentPath>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    require_course_access(&state, &user, &path.course_id).await?;

    let assessment =
        repositories::assessments::find_in_course(state.db(), &path.course_id, &path.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
            .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;

    Ok(Json(helpers::assessment_detail(&state, assessment).await?))
}

pub(super) async fn update_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<AssessmentPath>,
    Json(payload): Json<AssessmentUpdate>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    require_course_role(&state, &user, &path.course_id, EnrollmentRole::Instructor).await?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let assessment =
        repositories::assessments::find_in_course(state.db(), &path.course_id, &path.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
            .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;

    let kind = assessment.kind;
    let effective_limit = match payload.time_limit_minutes {
        Some(limit) => limit,
        None => assessment.time_limit_minutes,
    };
    validate_assessment_shape(kind, effective_limit)?;

    if let Some(ref questions) = payload.questions {
        validate_question_set(questions)?;

        let scored = repositories::assessments::has_scored_attempts(state.db(), &assessment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check scored attempts"))?;
        if scored {
            return Err(ApiError::Conflict(
                "Questions cannot be replaced after attempts have been scored".to_string(),
            ));
        }
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::assessments::update(
        &mut *tx,
        &assessment.id,
        repositories::assessments::UpdateAssessment {
            title: payload.title.as_deref(),
            description: payload.description.as_deref(),
            passing_score: payload.passing_score,
            shuffle_questions: payload.shuffle_questions,
            show_results: payload.show_results,
            time_limit_minutes: payload.time_limit_minutes,
            attempts_allowed: payload.attempts_allowed,
            generates_certificate: payload.generates_certificate,
        },
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update assessment"))?
    .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;

    // Replacing the question set is atomic: the old set only disappears if
    // every replacement row lands.
    if let Some(questions) = payload.questions {
        repositories::questions::delete_by_assessment(&mut *tx, &assessment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete questions"))?;
        helpers::insert_question_set(&mut tx, &assessment.id, questions).await?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    Ok(Json(helpers::assessment_detail(&state, updated).await?))
}

pub(super) async fn delete_assessment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(path): Path<AssessmentPath>,
) -> Result<StatusCode, ApiError> {
    require_course_role(&state, &user, &path.course_id, EnrollmentRole::Instructor).await?;

    let assessment =
        repositories::assessments::find_in_course(state.db(), &path.course_id, &path.assessment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
            .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;

    let deleted = repositories::assessments::delete(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assessment"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Assessment not found".to_string()))
    }
}
