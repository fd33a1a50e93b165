//! Test-data factories.
//!
//! Factories fill every field a caller does not override with a random
//! value and insert the result through the regular store operations, so the
//! produced entities always satisfy the store's invariants.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::database::Database;
use crate::error::DbError;
use crate::model::{Course, NewCourse, Student};

const RANDOM_NAME_LEN: usize = 12;

fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect()
}

/// Builds students.
#[derive(Debug, Clone, Default)]
pub struct StudentFactory {
    name: Option<String>,
}

impl StudentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the generated name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Inserts one student.
    pub fn make_one(&self, db: &Database) -> Result<Student, DbError> {
        let name = self.name.clone().unwrap_or_else(random_name);
        db.create_student(name)
    }

    /// Inserts `quantity` students and returns them in creation order.
    pub fn make(&self, db: &Database, quantity: usize) -> Result<Vec<Student>, DbError> {
        (0..quantity).map(|_| self.make_one(db)).collect()
    }
}

/// Builds courses.
#[derive(Debug, Clone, Default)]
pub struct CourseFactory {
    name: Option<String>,
    students: Vec<u64>,
}

impl CourseFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the generated name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enrolls the given students in every course produced.
    pub fn students(mut self, students: impl IntoIterator<Item = u64>) -> Self {
        self.students = students.into_iter().collect();
        self
    }

    /// Inserts one course.
    pub fn make_one(&self, db: &Database) -> Result<Course, DbError> {
        let name = self.name.clone().unwrap_or_else(random_name);
        db.create_course(NewCourse::new(name).with_students(self.students.iter().copied()))
    }

    /// Inserts `quantity` courses and returns them in creation order.
    pub fn make(&self, db: &Database, quantity: usize) -> Result<Vec<Course>, DbError> {
        (0..quantity).map(|_| self.make_one(db)).collect()
    }
}
