use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Enrollment, User};
use crate::db::types::{EnrollmentRole, EnrollmentStatus};
use crate::repositories;

pub(crate) struct CurrentUser(pub(crate) User);

/// Either an active enrollment or an implicit grant (platform admin, course
/// creator). Carries the effective role for the course.
#[derive(Debug, Clone)]
pub(crate) struct CourseAccess {
    pub(crate) role: EnrollmentRole,
    pub(crate) enrollment: Option<Enrollment>,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

pub(crate) async fn require_course_access(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<CourseAccess, ApiError> {
    if user.is_platform_admin {
        return Ok(CourseAccess { role: EnrollmentRole::Instructor, enrollment: None });
    }

    let course = repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if course.created_by == user.id {
        return Ok(CourseAccess { role: EnrollmentRole::Instructor, enrollment: None });
    }

    let enrollment =
        repositories::enrollments::find_for_user_course(state.db(), &user.id, course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?;

    let Some(enrollment) = enrollment else {
        return Err(ApiError::Forbidden("Enrollment required for this course"));
    };

    if enrollment.status != EnrollmentStatus::Active {
        return Err(ApiError::Forbidden("Enrollment required for this course"));
    }

    Ok(CourseAccess { role: enrollment.role, enrollment: Some(enrollment) })
}

pub(crate) async fn require_course_role(
    state: &AppState,
    user: &User,
    course_id: &str,
    role: EnrollmentRole,
) -> Result<CourseAccess, ApiError> {
    let access = require_course_access(state, user, course_id).await?;

    if user.is_platform_admin || access.role == role {
        return Ok(access);
    }

    Err(ApiError::Forbidden("Not enough permissions for this course"))
}
