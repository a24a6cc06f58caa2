mod handlers;
mod helpers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:course_id/assessments",
            post(handlers::create_assessment).get(handlers::list_assessments),
        )
        .route(
            "/:course_id/assessments/:assessment_id",
            get(handlers::get_assessment)
                .patch(handlers::update_assessment)
                .delete(handlers::delete_assessment),
        )
}
