pub(crate) mod assessments;
pub(crate) mod attempts;
pub(crate) mod course_modules;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod exam_configurations;
pub(crate) mod questions;
pub(crate) mod responses;
pub(crate) mod security_events;
pub(crate) mod security_sessions;
pub(crate) mod users;
