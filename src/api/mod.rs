pub(crate) mod assessments;
pub(crate) mod attempts;
pub(crate) mod auth;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pagination;
pub(crate) mod reports;
pub(crate) mod router;
pub(crate) mod security;
pub(crate) mod validation;
