//! Equality filters for listing courses.

use crate::model::Course;

/// Exact-match filters applied when listing courses.
///
/// Every supplied filter must match (logical AND). An empty filter matches
/// all courses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    /// Match on course id
    pub id: Option<u64>,
    /// Match on course name
    pub name: Option<String>,
}

impl CourseFilter {
    /// Filter matching a single id.
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    /// Filter matching an exact name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns true if no filter is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    /// Checks whether a course satisfies every supplied filter.
    pub fn matches(&self, course: &Course) -> bool {
        if let Some(id) = self.id {
            if course.id != id {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if &course.name != name {
                return false;
            }
        }
        true
    }
}
