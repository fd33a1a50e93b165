//! HTTP endpoint implementations for the course resource.

mod course_handlers;
mod request_utils;
mod response;

pub use course_handlers::{
    create_course, delete_course, list_courses, partial_update_course, retrieve_course,
    update_course,
};
pub use request_utils::{
    build_empty_response, build_response, map_db_error_to_router_error, parse_course_filter,
    parse_course_payload, parse_id, read_request_body_with_timeout, CoursePayload,
};
pub use response::{error_response, ApiError, ErrorResponse};
