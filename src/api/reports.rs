use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_role, CurrentUser};
use crate::core::state::AppState;
use crate::db::models::Assessment;
use crate::db::types::EnrollmentRole;
use crate::repositories;
use crate::schemas::report::{AssessmentResultsResponse, CourseResultsResponse};
use crate::services::{reporting, risk};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:course_id/results", get(course_results))
}

#[derive(Debug, Deserialize)]
struct ResultsQuery {
    #[serde(default)]
    #[serde(alias = "assessmentId")]
    assessment_id: Option<String>,
}

async fn course_results(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<CourseResultsResponse>, ApiError> {
    require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;

    let assessments: Vec<Assessment> = match query.assessment_id {
        Some(assessment_id) => {
            let assessment =
                repositories::assessments::find_in_course(state.db(), &course_id, &assessment_id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch assessment"))?
                    .ok_or_else(|| ApiError::NotFound("Assessment not found".to_string()))?;
            vec![assessment]
        }
        None => repositories::assessments::list_by_course(state.db(), &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list assessments"))?,
    };

    let mut results = Vec::new();
    for assessment in assessments {
        let rows =
            repositories::attempts::list_completed_by_assessment(state.db(), &assessment.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list completed attempts"))?;

        let attempts: Vec<reporting::CompletedAttempt> = rows
            .into_iter()
            .map(|row| reporting::CompletedAttempt {
                user_id: row.user_id,
                attempt_number: row.attempt_number,
                score: row.score.unwrap_or(0.0),
                passed: row.passed.unwrap_or(false),
                security_event_count: row.security_event_count,
            })
            .collect();

        let threshold =
            repositories::exam_configurations::find_by_assessment(state.db(), &assessment.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch exam configuration"))?
                .map(|config| config.alert_threshold as i64)
                .unwrap_or(risk::DEFAULT_ALERT_THRESHOLD);

        let summary = reporting::summarize(&attempts, threshold);
        results.push(AssessmentResultsResponse::from_summary(
            assessment.id,
            assessment.title,
            summary,
        ));
    }

    Ok(Json(CourseResultsResponse { course_id, assessments: results }))
}

#[cfg(test)]
mod tests;
