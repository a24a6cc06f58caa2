use sqlx::PgPool;

use crate::db::models::ExamConfiguration;

const COLUMNS: &str = "\
    id, assessment_id, allowed_attempts, proctoring_enabled, webcam_required, \
    lockdown_browser, alert_threshold, auto_suspend, manual_review_required, \
    created_at, updated_at";

pub(crate) struct CreateExamConfiguration<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) allowed_attempts: i32,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) alert_threshold: i32,
    pub(crate) auto_suspend: bool,
    pub(crate) manual_review_required: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateExamConfiguration<'_>,
) -> Result<ExamConfiguration, sqlx::Error> {
    sqlx::query_as::<_, ExamConfiguration>(&format!(
        "INSERT INTO exam_configurations (
            id, assessment_id, allowed_attempts, proctoring_enabled, webcam_required,
            lockdown_browser, alert_threshold, auto_suspend, manual_review_required,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.allowed_attempts)
    .bind(params.proctoring_enabled)
    .bind(params.webcam_required)
    .bind(params.lockdown_browser)
    .bind(params.alert_threshold)
    .bind(params.auto_suspend)
    .bind(params.manual_review_required)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Option<ExamConfiguration>, sqlx::Error> {
    sqlx::query_as::<_, ExamConfiguration>(&format!(
        "SELECT {COLUMNS} FROM exam_configurations WHERE assessment_id = $1",
    ))
    .bind(assessment_id)
    .fetch_optional(pool)
    .await
}
