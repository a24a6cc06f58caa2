use serde::Serialize;

use crate::services::reporting::{AssessmentSummary, BestAttempt};

#[derive(Debug, Serialize)]
pub(crate) struct BestAttemptResponse {
    pub(crate) user_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) score: f64,
    pub(crate) passed: bool,
}

impl BestAttemptResponse {
    pub(crate) fn from_summary(best: BestAttempt) -> Self {
        Self {
            user_id: best.user_id,
            attempt_number: best.attempt_number,
            score: best.score,
            passed: best.passed,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AssessmentResultsResponse {
    pub(crate) assessment_id: String,
    pub(crate) title: String,
    pub(crate) completed_attempts: i64,
    pub(crate) pass_rate: f64,
    pub(crate) average_score: f64,
    pub(crate) suspicious_attempts: i64,
    pub(crate) best_attempts: Vec<BestAttemptResponse>,
}

impl AssessmentResultsResponse {
    pub(crate) fn from_summary(assessment_id: String, title: String, summary: AssessmentSummary) -> Self {
        Self {
            assessment_id,
            title,
            completed_attempts: summary.completed_attempts,
            pass_rate: summary.pass_rate,
            average_score: summary.average_score,
            suspicious_attempts: summary.suspicious_attempts,
            best_attempts: summary
                .best_attempts
                .into_iter()
                .map(BestAttemptResponse::from_summary)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResultsResponse {
    pub(crate) course_id: String,
    pub(crate) assessments: Vec<AssessmentResultsResponse>,
}
