mod events;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sessions/:session_id/events",
            post(events::record_event).get(events::list_events),
        )
        .route("/events/:event_id/resolve", post(events::resolve_event))
}

#[cfg(test)]
mod tests;
