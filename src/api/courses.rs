use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_access, require_course_role, CurrentUser};
use crate::api::pagination::PageParams;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{EnrollmentRole, EnrollmentStatus};
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseResponse, EnrollmentCreate, EnrollmentListResponse, EnrollmentResponse,
    ModuleCreate, ModuleResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(list_courses))
        .route("/:course_id", get(get_course))
        .route("/:course_id/modules", post(create_module).get(list_modules))
        .route("/:course_id/enrollments", post(enroll_user).get(list_enrollments))
}

async fn create_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            description: payload.description.as_deref(),
            is_active: true,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    // The creator teaches their own course.
    repositories::enrollments::create(
        state.db(),
        repositories::enrollments::CreateEnrollment {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            user_id: &user.id,
            role: EnrollmentRole::Instructor,
            status: EnrollmentStatus::Active,
            joined_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enroll course creator"))?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    require_course_access(&state, &user, &course_id).await?;

    let course = repositories::courses::find_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(CourseResponse::from_db(course)))
}

async fn create_module(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
    Json(payload): Json<ModuleCreate>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;

    let now = primitive_now_utc();
    let module = repositories::course_modules::create(
        state.db(),
        repositories::course_modules::CreateModule {
            id: &Uuid::new_v4().to_string(),
            course_id: &course_id,
            title: &payload.title,
            order_index: payload.order_index,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create module"))?;

    Ok((StatusCode::CREATED, Json(ModuleResponse::from_db(module))))
}

async fn list_modules(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    require_course_access(&state, &user, &course_id).await?;

    let modules = repositories::course_modules::list_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list modules"))?;

    Ok(Json(modules.into_iter().map(ModuleResponse::from_db).collect()))
}

async fn enroll_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
    Json(payload): Json<EnrollmentCreate>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;

    let target = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let now = primitive_now_utc();
    let enrollment_id = Uuid::new_v4().to_string();
    let inserted = repositories::enrollments::create(
        state.db(),
        repositories::enrollments::CreateEnrollment {
            id: &enrollment_id,
            course_id: &course_id,
            user_id: &target.id,
            role: payload.role,
            status: EnrollmentStatus::Active,
            joined_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create enrollment"))?;

    if !inserted {
        return Err(ApiError::Conflict("User is already enrolled in this course".to_string()));
    }

    let enrollment =
        repositories::enrollments::find_for_user_course(state.db(), &target.id, &course_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
            .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn list_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<EnrollmentListResponse>, ApiError> {
    require_course_role(&state, &user, &course_id, EnrollmentRole::Instructor).await?;

    let items = repositories::enrollments::list_by_course(state.db(), &course_id, page.skip, page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;
    let total = repositories::enrollments::count_by_course(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;

    Ok(Json(EnrollmentListResponse {
        items: items.into_iter().map(EnrollmentResponse::from_db).collect(),
        total,
    }))
}

#[cfg(test)]
mod tests;
