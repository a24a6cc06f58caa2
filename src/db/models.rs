use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{
    AssessmentKind, AttemptStatus, EnrollmentRole, EnrollmentStatus, EventSeverity, QuestionKind,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) is_active: bool,
    pub(crate) is_platform_admin: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseModule {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) user_id: String,
    pub(crate) role: EnrollmentRole,
    pub(crate) status: EnrollmentStatus,
    pub(crate) joined_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Assessment {
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
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Proctoring defaults for an exam, snapshotted into each security session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamConfiguration {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) allowed_attempts: i32,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) alert_threshold: i32,
    pub(crate) auto_suspend: bool,
    pub(crate) manual_review_required: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) text: String,
    pub(crate) kind: QuestionKind,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) media_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Attempt {
    pub(crate) id: String,
    pub(crate) assessment_id: String,
    pub(crate) user_id: String,
    pub(crate) enrollment_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) ended_at: Option<PrimitiveDateTime>,
    pub(crate) status: AttemptStatus,
    pub(crate) score: Option<f64>,
    pub(crate) max_score: f64,
    pub(crate) passed: Option<bool>,
    pub(crate) time_spent_seconds: Option<i64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Response {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) answer_id: Option<String>,
    pub(crate) response_text: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: f64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SecuritySession {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) token_hash: String,
    pub(crate) ip_address: Option<String>,
    pub(crate) user_agent: Option<String>,
    pub(crate) screen_resolution: Option<String>,
    pub(crate) timezone: Option<String>,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) ended_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SecurityEvent {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) event_type: String,
    pub(crate) description: String,
    pub(crate) severity: EventSeverity,
    pub(crate) occurred_at: PrimitiveDateTime,
    pub(crate) metadata: Json<serde_json::Value>,
    pub(crate) flagged_for_review: bool,
    pub(crate) auto_resolved: bool,
    pub(crate) created_at: PrimitiveDateTime,
}
