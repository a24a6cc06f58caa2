use sqlx::PgPool;

use crate::db::models::Response;

const COLUMNS: &str = "\
    id, attempt_id, question_id, answer_id, response_text, is_correct, \
    points_earned, created_at";

pub(crate) struct CreateResponse<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) answer_id: Option<&'a str>,
    pub(crate) response_text: Option<&'a str>,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: f64,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateResponse<'_>,
) -> Result<Response, sqlx::Error> {
    sqlx::query_as::<_, Response>(&format!(
        "INSERT INTO responses (
            id, attempt_id, question_id, answer_id, response_text, is_correct,
            points_earned, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.answer_id)
    .bind(params.response_text)
    .bind(params.is_correct)
    .bind(params.points_earned)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_attempt(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<Response>, sqlx::Error> {
    sqlx::query_as::<_, Response>(&format!(
        "SELECT {COLUMNS} FROM responses WHERE attempt_id = $1 ORDER BY created_at, id",
    ))
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}
