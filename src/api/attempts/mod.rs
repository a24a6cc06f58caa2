mod manage;
mod start;
mod submit;

pub(crate) use manage::suspend_in_progress;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:course_id/assessments/:assessment_id/attempts", post(start::start_attempt))
        .route(
            "/:course_id/assessments/:assessment_id/attempts/submit",
            post(submit::submit_attempt),
        )
        .route("/:course_id/attempts/:attempt_id/suspend", post(manage::suspend_attempt))
        .route("/:course_id/attempts/:attempt_id/report", get(manage::attempt_report))
}
