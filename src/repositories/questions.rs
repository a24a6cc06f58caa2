use sqlx::PgPool;

use crate::db::models::{Answer, Question};
use crate::db::types::QuestionKind;

const QUESTION_COLUMNS: &str = "\
    id, assessment_id, text, kind, points, order_index, explanation, media_url";

const ANSWER_COLUMNS: &str = "id, question_id, text, is_correct, order_index";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) assessment_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) points: i32,
    pub(crate) order_index: i32,
    pub(crate) explanation: Option<&'a str>,
    pub(crate) media_url: Option<&'a str>,
}

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) text: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, assessment_id, text, kind, points, order_index, explanation, media_url
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {QUESTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assessment_id)
    .bind(params.text)
    .bind(params.kind)
    .bind(params.points)
    .bind(params.order_index)
    .bind(params.explanation)
    .bind(params.media_url)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAnswer<'_>,
) -> Result<Answer, sqlx::Error> {
    sqlx::query_as::<_, Answer>(&format!(
        "INSERT INTO answers (id, question_id, text, is_correct, order_index)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {ANSWER_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.text)
    .bind(params.is_correct)
    .bind(params.order_index)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions
         WHERE assessment_id = $1
         ORDER BY order_index, id",
    ))
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_answers_by_assessment(
    pool: &PgPool,
    assessment_id: &str,
) -> Result<Vec<Answer>, sqlx::Error> {
    sqlx::query_as::<_, Answer>(
        "SELECT ans.id, ans.question_id, ans.text, ans.is_correct, ans.order_index
         FROM answers ans
         JOIN questions q ON q.id = ans.question_id
         WHERE q.assessment_id = $1
         ORDER BY q.order_index, ans.order_index, ans.id",
    )
    .bind(assessment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_by_assessment(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE assessment_id = $1")
        .bind(assessment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
