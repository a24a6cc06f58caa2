use std::collections::HashMap;

use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Assessment;
use crate::repositories;
use crate::schemas::assessment::{
    AnswerResponse, AssessmentResponse, ExamConfigurationResponse, QuestionCreate,
    QuestionResponse,
};

pub(super) async fn insert_question_set(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assessment_id: &str,
    questions: Vec<QuestionCreate>,
) -> Result<Vec<QuestionResponse>, ApiError> {
    let mut responses = Vec::new();

    for question in questions {
        let question_id = Uuid::new_v4().to_string();
        let created = repositories::questions::create(
            &mut **tx,
            repositories::questions::CreateQuestion {
                id: &question_id,
                assessment_id,
                text: &question.text,
                kind: question.kind,
                points: question.points,
                order_index: question.order_index,
                explanation: question.explanation.as_deref(),
                media_url: question.media_url.as_deref(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

        let mut answers = Vec::new();
        for answer in question.answers {
            let created_answer = repositories::questions::create_answer(
                &mut **tx,
                repositories::questions::CreateAnswer {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    text: &answer.text,
                    is_correct: answer.is_correct,
                    order_index: answer.order_index,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create answer"))?;
            answers.push(AnswerResponse::from_db(created_answer));
        }

        responses.push(QuestionResponse::from_db(created, answers));
    }

    Ok(responses)
}

pub(super) async fn fetch_question_set(
    pool: &sqlx::PgPool,
    assessment_id: &str,
) -> Result<Vec<QuestionResponse>, ApiError> {
    let questions = repositories::questions::list_by_assessment(pool, assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;
    let answers = repositories::questions::list_answers_by_assessment(pool, assessment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch answers"))?;

    let mut by_question: HashMap<String, Vec<AnswerResponse>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id.clone()).or_default().push(AnswerResponse::from_db(answer));
    }

    Ok(questions
        .into_iter()
        .map(|question| {
            let answers = by_question.remove(&question.id).unwrap_or_default();
            QuestionResponse::from_db(question, answers)
        })
        .collect())
}

pub(super) async fn assessment_detail(
    state: &AppState,
    assessment: Assessment,
) -> Result<AssessmentResponse, ApiError> {
    let questions = fetch_question_set(state.db(), &assessment.id).await?;
    let config = repositories::exam_configurations::find_by_assessment(state.db(), &assessment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam configuration"))?
        .map(ExamConfigurationResponse::from_db);

    Ok(AssessmentResponse::from_db(assessment, questions, config))
}

pub(super) async fn create_exam_configuration(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assessment_id: &str,
    payload: &crate::schemas::assessment::ExamConfigurationCreate,
) -> Result<ExamConfigurationResponse, ApiError> {
    let now = primitive_now_utc();
    let config = repositories::exam_configurations::create(
        &mut **tx,
        repositories::exam_configurations::CreateExamConfiguration {
            id: &Uuid::new_v4().to_string(),
            assessment_id,
            allowed_attempts: payload.allowed_attempts,
            proctoring_enabled: payload.proctoring_enabled,
            webcam_required: payload.webcam_required,
            lockdown_browser: payload.lockdown_browser,
            alert_threshold: payload.alert_threshold,
            auto_suspend: payload.auto_suspend,
            manual_review_required: payload.manual_review_required,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam configuration"))?;

    Ok(ExamConfigurationResponse::from_db(config))
}
