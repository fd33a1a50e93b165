//! REST API server for the course store.
//!
//! Provides HTTP endpoints for listing, retrieving, creating, updating and
//! deleting courses, plus request routing and the hyper server loop.

pub mod handlers;
pub mod router;
pub mod server;
