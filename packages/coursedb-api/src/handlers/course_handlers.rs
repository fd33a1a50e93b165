//! Course resource handlers.

use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response};
use serde::Serialize;

use crate::router::{AppState, RouterError};

use super::request_utils::{
    build_empty_response, build_response, map_db_error_to_router_error, parse_course_filter,
    parse_course_payload, read_request_body_with_timeout, CoursePayload,
};

fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(data)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Reads the body and parses it as JSON or a urlencoded form, depending on
/// the request's content type.
async fn read_payload<B>(req: Request<B>, state: &AppState) -> Result<CoursePayload, RouterError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let body_bytes = read_request_body_with_timeout(body, state.config.request_timeout_ms).await?;
    parse_course_payload(content_type, &body_bytes)
}

/// Fails with 404 before the body is read, so a missing course is reported
/// the same way whatever the payload holds.
fn ensure_course_exists(id: u64, state: &AppState) -> Result<(), RouterError> {
    state
        .db
        .get_course(id)
        .map(|_| ())
        .map_err(map_db_error_to_router_error)
}

/// Lists courses, optionally filtered.
///
/// # Endpoint
/// `GET /api/v1/courses/?id={id}&name={name}`
///
/// # Response
/// - **200 OK**: JSON array in creation order
/// ```json
/// [{"id": 1, "name": "Python Development", "students": [1, 2]}]
/// ```
///
/// # Errors
/// - **400 Bad Request**: `id` filter is not an unsigned integer
///
/// # Notes
/// - Both filters are exact matches; supplying both requires both to match
/// - A filter that matches nothing returns `[]`
///
/// # Example
/// ```bash
/// curl 'http://localhost:8080/api/v1/courses/?name=Django'
/// ```
pub async fn list_courses<B>(req: Request<B>, state: AppState) -> Result<Response<Bytes>, RouterError> {
    let filter = parse_course_filter(req.uri().query())?;
    let courses = state
        .db
        .list_courses(&filter)
        .map_err(map_db_error_to_router_error)?;
    json_response(200, &courses)
}

/// Retrieves a single course.
///
/// # Endpoint
/// `GET /api/v1/courses/{id}/`
///
/// # Errors
/// - **404 Not Found**: Course not found or ID not numeric
pub async fn retrieve_course(id: u64, state: AppState) -> Result<Response<Bytes>, RouterError> {
    let course = state.db.get_course(id).map_err(map_db_error_to_router_error)?;
    json_response(200, &course)
}

/// Creates a new course.
///
/// # Endpoint
/// `POST /api/v1/courses/`
///
/// # Request Body
/// ```json
/// {"name": "Python Development", "students": [1, 2]}
/// ```
/// A urlencoded form (`name=...&students=1&students=2`) is accepted too.
///
/// # Response
/// - **201 Created**: Returns the stored course with its assigned id
///
/// # Errors
/// - **400 Bad Request**: Malformed body, missing or blank name, or unknown student id
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/courses/ \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Python Development", "students": [1, 2]}'
/// ```
pub async fn create_course<B>(req: Request<B>, state: AppState) -> Result<Response<Bytes>, RouterError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let new_course = read_payload(req, &state).await?.into_new_course()?;
    let course = state
        .db
        .create_course(new_course)
        .map_err(map_db_error_to_router_error)?;
    tracing::info!(id = course.id, name = %course.name, "course created");

    state.persist().await?;
    json_response(201, &course)
}

/// Partially updates a course.
///
/// # Endpoint
/// `PATCH /api/v1/courses/{id}/`
///
/// # Request Body
/// ```json
/// {"name": "Django"}
/// ```
///
/// # Response
/// - **200 OK**: Returns the updated course
///
/// # Errors
/// - **400 Bad Request**: Malformed body, blank name, or unknown student id
/// - **404 Not Found**: Course not found or ID not numeric; checked before the body
///
/// # Notes
/// - Only supplied fields are updated; omitted fields keep their value
pub async fn partial_update_course<B>(
    req: Request<B>,
    id: u64,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    ensure_course_exists(id, &state)?;
    let changes = read_payload(req, &state).await?.into_changes();
    let course = state
        .db
        .update_course(id, changes)
        .map_err(map_db_error_to_router_error)?;

    state.persist().await?;
    json_response(200, &course)
}

/// Fully updates a course.
///
/// # Endpoint
/// `PUT /api/v1/courses/{id}/`
///
/// # Notes
/// - `name` is required; an omitted `students` list clears enrollment
pub async fn update_course<B>(
    req: Request<B>,
    id: u64,
    state: AppState,
) -> Result<Response<Bytes>, RouterError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    ensure_course_exists(id, &state)?;
    let replacement = read_payload(req, &state).await?.into_new_course()?;
    let course = state
        .db
        .replace_course(id, replacement)
        .map_err(map_db_error_to_router_error)?;

    state.persist().await?;
    json_response(200, &course)
}

/// Deletes a course.
///
/// # Endpoint
/// `DELETE /api/v1/courses/{id}/`
///
/// # Response
/// - **204 No Content**: Course deleted; enrolled students are kept
///
/// # Errors
/// - **404 Not Found**: Course not found
pub async fn delete_course(id: u64, state: AppState) -> Result<Response<Bytes>, RouterError> {
    state
        .db
        .delete_course(id)
        .map_err(map_db_error_to_router_error)?;
    tracing::info!(id, "course deleted");

    state.persist().await?;
    build_empty_response(204)
}
