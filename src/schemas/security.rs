use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{SecurityEvent, SecuritySession};
use crate::db::types::EventSeverity;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SecurityEventCreate {
    #[serde(alias = "eventType")]
    #[validate(length(min = 1, max = 128, message = "event_type must be 1-128 characters"))]
    pub(crate) event_type: String,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub(crate) description: String,
    pub(crate) severity: EventSeverity,
    #[serde(default)]
    pub(crate) metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct SecurityEventResponse {
    pub(crate) id: String,
    pub(crate) session_id: String,
    pub(crate) event_type: String,
    pub(crate) description: String,
    pub(crate) severity: EventSeverity,
    pub(crate) occurred_at: String,
    pub(crate) metadata: serde_json::Value,
    pub(crate) flagged_for_review: bool,
    pub(crate) auto_resolved: bool,
}

impl SecurityEventResponse {
    pub(crate) fn from_db(event: SecurityEvent) -> Self {
        Self {
            id: event.id,
            session_id: event.session_id,
            event_type: event.event_type,
            description: event.description,
            severity: event.severity,
            occurred_at: format_primitive(event.occurred_at),
            metadata: event.metadata.0,
            flagged_for_review: event.flagged_for_review,
            auto_resolved: event.auto_resolved,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SecuritySessionResponse {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) proctoring_enabled: bool,
    pub(crate) webcam_required: bool,
    pub(crate) lockdown_browser: bool,
    pub(crate) started_at: String,
    pub(crate) ended_at: Option<String>,
}

impl SecuritySessionResponse {
    pub(crate) fn from_db(session: SecuritySession) -> Self {
        Self {
            id: session.id,
            attempt_id: session.attempt_id,
            proctoring_enabled: session.proctoring_enabled,
            webcam_required: session.webcam_required,
            lockdown_browser: session.lockdown_browser,
            started_at: format_primitive(session.started_at),
            ended_at: session.ended_at.map(format_primitive),
        }
    }
}

/// Result of recording an event, including the auto-suspension outcome when
/// the threshold wiring kicked in.
#[derive(Debug, Serialize)]
pub(crate) struct SecurityEventRecorded {
    pub(crate) event: SecurityEventResponse,
    pub(crate) attempt_suspended: bool,
}
