use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Course, CourseModule, Enrollment};
use crate::db::types::{EnrollmentRole, EnrollmentStatus};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            is_active: course.is_active,
            created_by: course.created_by,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ModuleCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) order_index: i32,
    pub(crate) created_at: String,
}

impl ModuleResponse {
    pub(crate) fn from_db(module: CourseModule) -> Self {
        Self {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            order_index: module.order_index,
            created_at: format_primitive(module.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentCreate {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
    #[serde(default = "default_role")]
    pub(crate) role: EnrollmentRole,
}

fn default_role() -> EnrollmentRole {
    EnrollmentRole::Student
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) user_id: String,
    pub(crate) role: EnrollmentRole,
    pub(crate) status: EnrollmentStatus,
    pub(crate) joined_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            user_id: enrollment.user_id,
            role: enrollment.role,
            status: enrollment.status,
            joined_at: format_primitive(enrollment.joined_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentListResponse {
    pub(crate) items: Vec<EnrollmentResponse>,
    pub(crate) total: i64,
}
