use crate::api::errors::ApiError;
use crate::db::types::{AssessmentKind, QuestionKind};
use crate::schemas::assessment::QuestionCreate;

/// Cardinality rules checked before any insert so a bad payload never leaves
/// a partial question set behind.
pub(crate) fn validate_question_set(questions: &[QuestionCreate]) -> Result<(), ApiError> {
    for (index, question) in questions.iter().enumerate() {
        let position = index + 1;
        let correct = question.answers.iter().filter(|answer| answer.is_correct).count();

        match question.kind {
            QuestionKind::OpenText => {
                if !question.answers.is_empty() {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: open_text questions must not define answers"
                    )));
                }
            }
            QuestionKind::TrueFalse => {
                if question.answers.len() != 2 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: true_false questions require exactly 2 answers"
                    )));
                }
                if correct != 1 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: true_false questions require exactly 1 correct answer"
                    )));
                }
            }
            QuestionKind::SingleChoice => {
                if question.answers.len() < 2 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: at least 2 answers are required"
                    )));
                }
                if correct != 1 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: single_choice questions require exactly 1 correct answer"
                    )));
                }
            }
            QuestionKind::MultipleChoice => {
                if question.answers.len() < 2 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: at least 2 answers are required"
                    )));
                }
                if correct == 0 {
                    return Err(ApiError::BadRequest(format!(
                        "Question {position}: at least 1 correct answer is required"
                    )));
                }
            }
        }
    }

    Ok(())
}

pub(crate) fn validate_assessment_shape(
    kind: AssessmentKind,
    time_limit_minutes: Option<i32>,
) -> Result<(), ApiError> {
    match time_limit_minutes {
        Some(limit) if limit <= 0 => {
            Err(ApiError::BadRequest("time_limit_minutes must be positive".to_string()))
        }
        None if kind == AssessmentKind::Exam => {
            Err(ApiError::BadRequest("Exams require a time limit".to_string()))
        }
        _ => Ok(()),
    }
}
