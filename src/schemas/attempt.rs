use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Attempt, Response};
use crate::db::types::AttemptStatus;
use crate::schemas::security::{SecurityEventResponse, SecuritySessionResponse};
use crate::services::risk::RiskLevel;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AttemptStart {
    #[serde(default)]
    #[serde(alias = "screenResolution")]
    pub(crate) screen_resolution: Option<String>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseSubmit {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "answerId")]
    pub(crate) answer_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "responseText")]
    pub(crate) response_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttemptSubmit {
    pub(crate) responses: Vec<ResponseSubmit>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptSuspend {
    #[validate(length(min = 1, message = "reason must not be empty"))]
    pub(crate) reason: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) user_id: String,
    pub(crate) enrollment_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: String,
    pub(crate) ended_at: Option<String>,
    pub(crate) status: AttemptStatus,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: f64,
    pub(crate) passed: Option<bool>,
    pub(crate) time_spent_seconds: Option<i64>,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: Attempt) -> Self {
        Self {
            id: attempt.id,
            assessment_id: attempt.assessment_id,
            user_id: attempt.user_id,
            enrollment_id: attempt.enrollment_id,
            attempt_number: attempt.attempt_number,
            started_at: format_primitive(attempt.started_at),
            ended_at: attempt.ended_at.map(format_primitive),
            status: attempt.status,
            score: attempt.score,
            max_score: attempt.max_score,
            passed: attempt.passed,
            time_spent_seconds: attempt.time_spent_seconds,
        }
    }
}

/// Snapshot of the proctoring flags active for the new attempt's session.
#[derive(Debug, Serialize)]
pub(crate) struct SecurityConfigSummary {
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptStartResponse {
    pub(crate) attempt: AttemptResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) security_config: Option<SecurityConfigSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseDetail {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) answer_id: Option<String>,
    pub(crate) response_text: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: f64,
}

impl ResponseDetail {
    pub(crate) fn from_db(response: Response) -> Self {
        Self {
            id: response.id,
            question_id: response.question_id,
            answer_id: response.answer_id,
            response_text: response.response_text,
            is_correct: response.is_correct,
            points_earned: response.points_earned,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptSubmitResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) responses: Vec<ResponseDetail>,
    pub(crate) skipped_question_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptReportResponse {
    pub(crate) attempt: AttemptResponse,
    pub(crate) responses: Vec<ResponseDetail>,
    pub(crate) session: Option<SecuritySessionResponse>,
    pub(crate) security_events: Vec<SecurityEventResponse>,
    pub(crate) risk_level: RiskLevel,
    pub(crate) requires_review: bool,
}
