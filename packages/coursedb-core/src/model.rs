//! Course and student entities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A student that courses can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Auto-assigned identifier
    pub id: u64,
    /// Display name
    pub name: String,
}

/// A course with its enrolled students.
///
/// `students` holds student ids; it serializes as an ascending JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Auto-assigned identifier, immutable
    pub id: u64,
    /// Course name
    pub name: String,
    /// Ids of enrolled students
    #[serde(default)]
    pub students: BTreeSet<u64>,
}

/// Values for a course that does not exist yet, or for a full replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub students: Vec<u64>,
}

impl NewCourse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            students: Vec::new(),
        }
    }

    /// Sets the enrolled student ids.
    pub fn with_students(mut self, students: impl IntoIterator<Item = u64>) -> Self {
        self.students = students.into_iter().collect();
        self
    }
}

/// Partial update of a course. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub students: Option<Vec<u64>>,
}

impl From<NewCourse> for CourseChanges {
    fn from(course: NewCourse) -> Self {
        Self {
            name: Some(course.name),
            students: Some(course.students),
        }
    }
}
