//! Storage engine for the course/student API.
//!
//! Provides the data model, an in-memory store with atomic per-operation
//! commits, list filters, snapshot persistence, and test-data factories.

pub mod config;
pub mod database;
pub mod error;
pub mod factory;
pub mod model;
pub mod persistence;
pub mod query;

pub use database::Database;
pub use error::DbError;
pub use model::{Course, CourseChanges, NewCourse, Student};
pub use query::CourseFilter;
