use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Assessment;
use crate::db::types::AssessmentKind;

const COLUMNS: &str = "\
    id, module_id, kind, title, description, passing_score, shuffle_questions, \
    show_results, time_limit_minutes, attempts_allowed, generates_certificate, \
    created_by, created_at, updated_at";

const ALIASED_COLUMNS: &str = "\
    a.id, a.module_id, a.kind, a.title, a.description, a.passing_score, a.shuffle_questions, \
    a.show_results, a.time_limit_minutes, a.attempts_allowed, a.generates_certificate, \
    a.created_by, a.created_at, a.updated_at";

pub(crate) struct CreateAssessment<'a> {
    pub(crate) id: &'a str,
    pub(crate) module_id: &'a str,
    pub(crate) kind: AssessmentKind,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) passing_score: f64,
    pub(crate) shuffle_questions: bool,
    pub(crate) show_results: bool,
    pub(crate) time_limit_minutes: Option<i32>,
    pub(crate) attempts_allowed: i32,
    pub(crate) generates_certificate: bool,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

#[derive(Debug, Default)]
pub(crate) struct UpdateAssessment<'a> {
    pub(crate) title: Option<&'a str>,
    pub(crate) description: Option<&'a str>,
    pub(crate) passing_score: Option<f64>,
    pub(crate) shuffle_questions: Option<bool>,
    pub(crate) show_results: Option<bool>,
    pub(crate) time_limit_minutes: Option<Option<i32>>,
    pub(crate) attempts_allowed: Option<i32>,
    pub(crate) generates_certificate: Option<bool>,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateAssessment<'_>,
) -> Result<Assessment, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "INSERT INTO assessments (
            id, module_id, kind, title, description, passing_score, shuffle_questions,
            show_results, time_limit_minutes, attempts_allowed, generates_certificate,
            created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.module_id)
    .bind(params.kind)
    .bind(params.title)
    .bind(params.description)
    .bind(params.passing_score)
    .bind(params.shuffle_questions)
    .bind(params.show_results)
    .bind(params.time_limit_minutes)
    .bind(params.attempts_allowed)
    .bind(params.generates_certificate)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

/// Looks the assessment up through the module chain so callers can verify
/// course ownership in one query.
pub(crate) async fn find_in_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
    assessment_id: &str,
) -> Result<Option<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {ALIASED_COLUMNS} FROM assessments a
         JOIN course_modules m ON m.id = a.module_id
         WHERE a.id = $1 AND m.course_id = $2",
    ))
    .bind(assessment_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_by_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Assessment>, sqlx::Error> {
    sqlx::query_as::<_, Assessment>(&format!(
        "SELECT {ALIASED_COLUMNS} FROM assessments a
         JOIN course_modules m ON m.id = a.module_id
         WHERE m.course_id = $1
         ORDER BY m.order_index, a.created_at",
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    fields: UpdateAssessment<'_>,
    now: time::PrimitiveDateTime,
) -> Result<Option<Assessment>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE assessments SET updated_at = ");
    builder.push_bind(now);

    if let Some(title) = fields.title {
        builder.push(", title = ");
        builder.push_bind(title);
    }
    if let Some(description) = fields.description {
        builder.push(", description = ");
        builder.push_bind(description);
    }
    if let Some(passing_score) = fields.passing_score {
        builder.push(", passing_score = ");
        builder.push_bind(passing_score);
    }
    if let Some(shuffle_questions) = fields.shuffle_questions {
        builder.push(", shuffle_questions = ");
        builder.push_bind(shuffle_questions);
    }
    if let Some(show_results) = fields.show_results {
        builder.push(", show_results = ");
        builder.push_bind(show_results);
    }
    if let Some(time_limit_minutes) = fields.time_limit_minutes {
        builder.push(", time_limit_minutes = ");
        builder.push_bind(time_limit_minutes);
    }
    if let Some(attempts_allowed) = fields.attempts_allowed {
        builder.push(", attempts_allowed = ");
        builder.push_bind(attempts_allowed);
    }
    if let Some(generates_certificate) = fields.generates_certificate {
        builder.push(", generates_certificate = ");
        builder.push_bind(generates_certificate);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(format!(" RETURNING {COLUMNS}"));

    builder.build_query_as::<Assessment>().fetch_optional(executor).await
}

pub(crate) async fn course_id_of(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT m.course_id FROM assessments a
         JOIN course_modules m ON m.id = a.module_id
         WHERE a.id = $1",
    )
    .bind(assessment_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assessments WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn has_scored_attempts(
    executor: impl sqlx::PgExecutor<'_>,
    assessment_id: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attempts WHERE assessment_id = $1 AND score IS NOT NULL",
    )
    .bind(assessment_id)
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}
