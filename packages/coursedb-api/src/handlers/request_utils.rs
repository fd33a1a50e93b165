//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::Response;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tokio::time;

use crate::router::RouterError;
use coursedb_core::{CourseChanges, CourseFilter, DbError, NewCourse};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(body: B, timeout_ms: u64) -> Result<Bytes, RouterError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, body.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Map DbError to appropriate RouterError
pub fn map_db_error_to_router_error(e: DbError) -> RouterError {
    match e {
        DbError::CourseNotFound { .. } => RouterError::NotFound(e.to_string()),
        DbError::StudentNotFound { .. } | DbError::Validation { .. } => {
            RouterError::BadRequest(e.to_string())
        }
        _ => RouterError::InternalError(format!("Store error: {}", e)),
    }
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Parses a course id path segment. A segment that is not a `u64` cannot
/// name a course, so it is reported as not found.
pub fn parse_id(raw: &str) -> Result<u64, RouterError> {
    raw.parse()
        .map_err(|e| RouterError::NotFound(format!("No course with ID '{}': {}", raw, e)))
}

/// Decodes one `application/x-www-form-urlencoded` component.
fn decode_component(raw: &str) -> Result<String, RouterError> {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8()
        .map(|value| value.into_owned())
        .map_err(|e| RouterError::BadRequest(format!("Invalid UTF-8 in '{}': {}", raw, e)))
}

/// Splits a urlencoded string into decoded key/value pairs.
fn parse_pairs(encoded: &str) -> Result<Vec<(String, String)>, RouterError> {
    let mut pairs = Vec::new();
    for pair in encoded.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        pairs.push((decode_component(key)?, decode_component(value)?));
    }
    Ok(pairs)
}

/// Parses list filters from the URL query string.
///
/// `id` must be an unsigned integer. Empty values and unknown keys are
/// ignored; a repeated key keeps its last value.
pub fn parse_course_filter(query_str: Option<&str>) -> Result<CourseFilter, RouterError> {
    let mut filter = CourseFilter::default();
    let Some(query_str) = query_str else {
        return Ok(filter);
    };

    for (key, value) in parse_pairs(query_str)? {
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "id" => {
                filter.id = Some(value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid id filter '{}': {}", value, e))
                })?);
            }
            "name" => filter.name = Some(value),
            _ => {}
        }
    }
    Ok(filter)
}

/// Course fields accepted in POST, PUT and PATCH bodies.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct CoursePayload {
    /// Course name
    #[serde(default)]
    pub name: Option<String>,
    /// Ids of existing students
    #[serde(default)]
    pub students: Option<Vec<u64>>,
}

impl CoursePayload {
    /// Converts a create/replace payload; `name` is required.
    pub fn into_new_course(self) -> Result<NewCourse, RouterError> {
        let name = self
            .name
            .ok_or_else(|| RouterError::BadRequest("name: This field is required.".to_string()))?;
        Ok(NewCourse {
            name,
            students: self.students.unwrap_or_default(),
        })
    }

    /// Converts a partial update payload; absent fields stay unchanged.
    pub fn into_changes(self) -> CourseChanges {
        CourseChanges {
            name: self.name,
            students: self.students,
        }
    }
}

/// Parses a course payload from a JSON or urlencoded form body.
///
/// Bodies without a form content type are read as JSON. An empty body is an
/// empty payload.
pub fn parse_course_payload(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<CoursePayload, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CoursePayload::default());
    }

    let is_form = content_type
        .map(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false);
    if !is_form {
        return serde_json::from_slice(body)
            .map_err(|e| RouterError::BadRequest(format!("Failed to parse request: {}", e)));
    }

    let encoded = std::str::from_utf8(body)
        .map_err(|e| RouterError::BadRequest(format!("Invalid UTF-8 in form body: {}", e)))?;
    let mut payload = CoursePayload::default();
    for (key, value) in parse_pairs(encoded)? {
        match key.as_str() {
            "name" => payload.name = Some(value),
            "students" => {
                let id = value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid student id '{}': {}", value, e))
                })?;
                payload.students.get_or_insert_with(Vec::new).push(id);
            }
            _ => {}
        }
    }
    Ok(payload)
}
