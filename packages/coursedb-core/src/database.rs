//! Database container holding courses and students.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::model::{Course, CourseChanges, NewCourse, Student};
use crate::query::CourseFilter;

/// Raw table contents. Ids are allocated from `last_*_id` and never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    /// Students keyed by id
    pub students: BTreeMap<u64, Student>,
    /// Courses keyed by id; iteration order is creation order
    pub courses: BTreeMap<u64, Course>,
    /// Highest student id handed out so far
    pub last_student_id: u64,
    /// Highest course id handed out so far
    pub last_course_id: u64,
}

impl Tables {
    fn resolve_students(&self, ids: &[u64]) -> Result<BTreeSet<u64>, DbError> {
        let mut resolved = BTreeSet::new();
        for &id in ids {
            if !self.students.contains_key(&id) {
                return Err(DbError::StudentNotFound { id });
            }
            resolved.insert(id);
        }
        Ok(resolved)
    }
}

/// In-memory store for courses and students.
///
/// Every public operation takes the lock once, validates, and then mutates,
/// so a failed call leaves the store untouched and readers never see a
/// partial write.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a database from previously saved table contents.
    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Returns a copy of the current table contents.
    pub fn snapshot(&self) -> Result<Tables, DbError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DbError> {
        self.tables.read().map_err(|_| DbError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DbError> {
        self.tables.write().map_err(|_| DbError::LockPoisoned)
    }

    /// Inserts a new student and returns it with its assigned id.
    pub fn create_student(&self, name: impl Into<String>) -> Result<Student, DbError> {
        let mut tables = self.write()?;
        tables.last_student_id += 1;
        let student = Student {
            id: tables.last_student_id,
            name: name.into(),
        };
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    /// Looks up a student by id.
    pub fn get_student(&self, id: u64) -> Result<Student, DbError> {
        self.read()?
            .students
            .get(&id)
            .cloned()
            .ok_or(DbError::StudentNotFound { id })
    }

    /// Returns the number of students.
    pub fn student_count(&self) -> Result<usize, DbError> {
        Ok(self.read()?.students.len())
    }

    /// Creates a new course.
    ///
    /// # Arguments
    /// * `new` - Course name and ids of existing students to enroll
    ///
    /// # Returns
    /// The stored course, or `Validation` for a blank name and
    /// `StudentNotFound` for an unknown student id.
    pub fn create_course(&self, new: NewCourse) -> Result<Course, DbError> {
        let name = validate_name(new.name)?;
        let mut tables = self.write()?;
        let students = tables.resolve_students(&new.students)?;

        tables.last_course_id += 1;
        let course = Course {
            id: tables.last_course_id,
            name,
            students,
        };
        tables.courses.insert(course.id, course.clone());
        tracing::debug!(id = course.id, "created course");
        Ok(course)
    }

    /// Looks up a course by id.
    pub fn get_course(&self, id: u64) -> Result<Course, DbError> {
        self.read()?
            .courses
            .get(&id)
            .cloned()
            .ok_or(DbError::CourseNotFound { id })
    }

    /// Lists courses matching `filter` in creation order.
    pub fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, DbError> {
        let tables = self.read()?;
        if filter.is_empty() {
            return Ok(tables.courses.values().cloned().collect());
        }
        if let Some(id) = filter.id {
            return Ok(tables
                .courses
                .get(&id)
                .filter(|course| filter.matches(course))
                .cloned()
                .into_iter()
                .collect());
        }
        Ok(tables
            .courses
            .values()
            .filter(|course| filter.matches(course))
            .cloned()
            .collect())
    }

    /// Applies a partial update. Fields left as `None` keep their value.
    ///
    /// # Returns
    /// The updated course. `CourseNotFound` takes precedence over field
    /// errors, and nothing is written if any supplied field is invalid.
    pub fn update_course(&self, id: u64, changes: CourseChanges) -> Result<Course, DbError> {
        let mut tables = self.write()?;
        if !tables.courses.contains_key(&id) {
            return Err(DbError::CourseNotFound { id });
        }
        let name = changes.name.map(validate_name).transpose()?;
        let students = match changes.students {
            Some(ids) => Some(tables.resolve_students(&ids)?),
            None => None,
        };

        let course = tables
            .courses
            .get_mut(&id)
            .ok_or(DbError::CourseNotFound { id })?;
        if let Some(name) = name {
            course.name = name;
        }
        if let Some(students) = students {
            course.students = students;
        }
        Ok(course.clone())
    }

    /// Replaces every mutable field of a course.
    pub fn replace_course(&self, id: u64, course: NewCourse) -> Result<Course, DbError> {
        self.update_course(id, course.into())
    }

    /// Deletes a course. Enrolled students are not affected.
    pub fn delete_course(&self, id: u64) -> Result<Course, DbError> {
        let removed = self
            .write()?
            .courses
            .remove(&id)
            .ok_or(DbError::CourseNotFound { id })?;
        tracing::debug!(id, "deleted course");
        Ok(removed)
    }

    /// Returns the number of courses.
    pub fn course_count(&self) -> Result<usize, DbError> {
        Ok(self.read()?.courses.len())
    }
}

fn validate_name(name: String) -> Result<String, DbError> {
    if name.trim().is_empty() {
        return Err(DbError::Validation {
            field: "name",
            message: "This field may not be blank.".to_string(),
        });
    }
    Ok(name)
}
