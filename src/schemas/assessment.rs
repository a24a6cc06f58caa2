use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Assessment, ExamConfiguration, Question};
use crate::db::types::{AssessmentKind, QuestionKind};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[validate(length(min = 1, message = "answer text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "question text must not be empty"))]
    pub(crate) text: String,
    pub(crate) kind: QuestionKind,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "points must be positive"))]
    pub(crate) points: i32,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    pub(crate) order_index: i32,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    #[serde(alias = "mediaUrl")]
    pub(crate) media_url: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) answers: Vec<AnswerCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamConfigurationCreate {
    #[serde(default = "default_allowed_attempts")]
    #[serde(alias = "allowedAttempts")]
    #[validate(range(min = 1, message = "allowed_attempts must be positive"))]
    pub(crate) allowed_attempts: i32,
    #[serde(default)]
    #[serde(alias = "proctoringEnabled")]
    pub(crate) proctoring_enabled: bool,
    #[serde(default)]
    #[serde(alias = "webcamRequired")]
    pub(crate) webcam_required: bool,
    #[serde(default)]
    #[serde(alias = "lockdownBrowser")]
    pub(crate) lockdown_browser: bool,
    #[serde(default = "default_alert_threshold")]
    #[serde(alias = "alertThreshold")]
    #[validate(range(min = 1, message = "alert_threshold must be positive"))]
    pub(crate) alert_threshold: i32,
    #[serde(default)]
    #[serde(alias = "autoSuspend")]
    pub(crate) auto_suspend: bool,
    #[serde(default)]
    #[serde(alias = "manualReviewRequired")]
    pub(crate) manual_review_required: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssessmentCreate {
    pub(crate) kind: AssessmentKind,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0.0, max = 100.0, message = "passing_score must be within 0-100"))]
    pub(crate) passing_score: f64,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: bool,
    #[serde(default = "default_true")]
    #[serde(alias = "showResults")]
    pub(crate) show_results: bool,
    #[serde(default)]
    #[serde(alias = "timeLimitMinutes")]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default = "default_attempts_allowed")]
    #[serde(alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: i32,
    #[serde(default)]
    #[serde(alias = "generatesCertificate")]
    pub(crate) generates_certificate: bool,
    #[validate(length(min = 1, message = "at least one question is required"))]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
    #[serde(default)]
    #[serde(alias = "examConfiguration")]
    #[validate(nested)]
    pub(crate) exam_configuration: Option<ExamConfigurationCreate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct AssessmentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "passingScore")]
    #[validate(range(min = 0.0, max = 100.0, message = "passing_score must be within 0-100"))]
    pub(crate) passing_score: Option<f64>,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: Option<bool>,
    #[serde(default)]
    #[serde(alias = "showResults")]
    pub(crate) show_results: Option<bool>,
    /// Absent leaves the limit untouched; an explicit null clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[serde(alias = "timeLimitMinutes")]
    pub(crate) time_limit_minutes: Option<Option<i32>>,
    #[serde(default)]
    #[serde(alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: Option<i32>,
    #[serde(default)]
    #[serde(alias = "generatesCertificate")]
    pub(crate) generates_certificate: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Option<Vec<QuestionCreate>>,
}

/// Distinguishes a field set to null from a field left out of the payload.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: Answer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            text: answer.text,
            is_correct: answer.is_correct,
            order_index: answer.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) media_url: Option<String>,
    pub(crate) answers: Vec<AnswerResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question, answers: Vec<AnswerResponse>) -> Self {
        Self {
            id: question.id,
            assessment_id: question.assessment_id,
            text: question.text,
            kind: question.kind,
            points: question.points,
            order_index: question.order_index,
            explanation: question.explanation,
            media_url: question.media_url,
            answers,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamConfigurationResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) allowed_attempts: i32,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) alert_threshold: i32,
    pub(crate) auto_suspend: bool,
    pub(crate) manual_review_required: bool,
}

impl ExamConfigurationResponse {
    pub(crate) fn from_db(config: ExamConfiguration) -> Self {
        Self {
            id: config.id,
            assessment_id: config.assessment_id,
            allowed_attempts: config.allowed_attempts,
            proctoring_enabled: config.proctoring_enabled,
            webcam_required: config.webcam_required,
            lockdown_browser: config.lockdown_browser,
            alert_threshold: config.alert_threshold,
            auto_suspend: config.auto_suspend,
            manual_review_required: config.manual_review_required,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResponse {
    pub(crate) id: String,
    pub(crate) module_id: String,
    pub(crate) kind: AssessmentKind,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) passing_score: f64,
    pub(crate) shuffle_questions: bool,
    pub(crate) show_results: bool,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) attempts_allowed: i32,
    pub(crate) generates_certificate: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) exam_configuration: Option<ExamConfigurationResponse>,
}

impl AssessmentResponse {
    pub(crate) fn from_db(
        assessment: Assessment,
        questions: Vec<QuestionResponse>,
        exam_configuration: Option<ExamConfigurationResponse>,
    ) -> Self {
        Self {
            id: assessment.id,
            module_id: assessment.module_id,
            kind: assessment.kind,
            title: assessment.title,
            description: assessment.description,
            passing_score: assessment.passing_score,
            shuffle_questions: assessment.shuffle_questions,
            show_results: assessment.show_results,
            time_limit_minutes: assessment.time_limit_minutes,
            attempts_allowed: assessment.attempts_allowed,
            generates_certificate: assessment.generates_certificate,
            created_by: assessment.created_by,
            created_at: format_primitive(assessment.created_at),
            updated_at: format_primitive(assessment.updated_at),
            questions,
            exam_configuration,
        }
    }
}

fn default_points() -> i32 {
    1
}

fn default_attempts_allowed() -> i32 {
    3
}

fn default_allowed_attempts() -> i32 {
    1
}

fn default_alert_threshold() -> i32 {
    3
}

fn default_true() -> bool {
    true
}
