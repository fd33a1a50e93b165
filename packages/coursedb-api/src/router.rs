//! Matchit routing configuration.

use std::sync::Arc;

use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use matchit::Router as MatchitRouter;

use crate::handlers;
use coursedb_core::config::DbConfig;
use coursedb_core::persistence::PersistenceManager;
use coursedb_core::Database;

/// Collection route prefix.
pub const COURSES_PATH: &str = "/api/v1/courses";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database instance
    pub db: Arc<Database>,
    /// Database configuration
    pub config: Arc<DbConfig>,
    /// Snapshot writer, present when a data directory is configured
    pub persistence: Option<Arc<PersistenceManager>>,
}

impl AppState {
    /// Writes a snapshot after a successful mutation, if enabled.
    ///
    /// The write runs on the blocking pool so file I/O never stalls the
    /// connection tasks.
    pub async fn persist(&self) -> Result<(), RouterError> {
        if !self.config.persistence_enabled() {
            return Ok(());
        }
        let Some(persistence) = self.persistence.clone() else {
            return Ok(());
        };
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || persistence.save(&db))
            .await
            .map_err(|e| RouterError::InternalError(format!("Snapshot task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!("Failed to save snapshot: {}", e);
                RouterError::InternalError(format!("Failed to save snapshot: {}", e))
            })
    }
}

/// HTTP request router.
pub struct Router {
    inner: MatchitRouter<RouteHandler>,
    state: AppState,
}

impl Router {
    /// Creates a new router with the course routes.
    ///
    /// Both `/api/v1/courses/` and `/api/v1/courses` are accepted, and the
    /// same for item routes.
    pub fn new(
        db: Arc<Database>,
        config: Arc<DbConfig>,
        persistence: Option<PersistenceManager>,
    ) -> Self {
        let mut router = MatchitRouter::new();

        let collection = COURSES_PATH.to_string();
        let item = format!("{}/{{id}}", COURSES_PATH);
        for path in [&collection, &item] {
            router
                .insert(path.as_str(), route_for(path, &item))
                .unwrap_or_else(|e| panic!("Failed to insert {} route: {}", path, e));
            router
                .insert(format!("{}/", path), route_for(path, &item))
                .unwrap_or_else(|e| panic!("Failed to insert {}/ route: {}", path, e));
        }

        Self {
            inner: router,
            state: AppState {
                db,
                config,
                persistence: persistence.map(Arc::new),
            },
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Routes a request and turns any error into its JSON error response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Bytes>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match self.route(req).await {
            Ok(response) => response,
            Err(err) => {
                if let RouterError::InternalError(msg) = &err {
                    tracing::error!("Error handling {} {}: {}", method, path, msg);
                }
                Response::from(err)
            }
        };
        tracing::debug!(%method, %path, status = response.status().as_u16(), "handled request");
        response
    }

    /// Routes an incoming request to the appropriate handler.
    ///
    /// # Arguments
    /// * `req` - HTTP request
    ///
    /// # Returns
    /// `Result<Response<Bytes>, RouterError>` containing the response or an error.
    pub async fn route<B>(&self, req: Request<B>) -> Result<Response<Bytes>, RouterError>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();

        match self.inner.at(&path) {
            Ok(matched) => {
                let handler = *matched.value;
                let id = matched.params.get("id").map(str::to_string);
                handler.handle(req, id, self.state.clone()).await
            }
            Err(_) => Err(RouterError::NotFound(format!("No route found for {}", path))),
        }
    }
}

fn route_for(path: &str, item: &str) -> RouteHandler {
    if path == item {
        RouteHandler::Course
    } else {
        RouteHandler::Courses
    }
}

/// Route handler function.
#[derive(Debug, Clone, Copy)]
enum RouteHandler {
    Courses,
    Course,
}

impl RouteHandler {
    /// Handles a request with the given route parameters.
    async fn handle<B>(
        self,
        req: Request<B>,
        id: Option<String>,
        state: AppState,
    ) -> Result<Response<Bytes>, RouterError>
    where
        B: Body<Data = Bytes>,
        B::Error: std::fmt::Display,
    {
        let method = req.method().clone();
        match self {
            RouteHandler::Courses => match method {
                Method::GET => handlers::list_courses(req, state).await,
                Method::POST => handlers::create_course(req, state).await,
                _ => Err(RouterError::MethodNotAllowed),
            },
            RouteHandler::Course => {
                let id = handlers::parse_id(id.as_deref().unwrap_or_default())?;
                match method {
                    Method::GET => handlers::retrieve_course(id, state).await,
                    Method::PATCH => handlers::partial_update_course(req, id, state).await,
                    Method::PUT => handlers::update_course(req, id, state).await,
                    Method::DELETE => handlers::delete_course(id, state).await,
                    _ => Err(RouterError::MethodNotAllowed),
                }
            }
        }
    }
}

/// Router error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    MethodNotAllowed,
    InternalError(String),
    Timeout,
    BadRequest(String),
    NotFound(String),
}

impl RouterError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            RouterError::MethodNotAllowed => 405,
            RouterError::InternalError(_) => 500,
            RouterError::Timeout => 408,
            RouterError::BadRequest(_) => 400,
            RouterError::NotFound(_) => 404,
        }
    }
}

impl std::fmt::Display for RouterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            RouterError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            RouterError::Timeout => write!(f, "Request Timeout"),
            RouterError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            RouterError::NotFound(msg) => write!(f, "Not Found: {}", msg),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<RouterError> for Response<Bytes> {
    fn from(err: RouterError) -> Self {
        let status = err.status();
        let (message, details) = match &err {
            RouterError::MethodNotAllowed => ("Method Not Allowed".to_string(), None),
            RouterError::Timeout => ("Request Timeout".to_string(), None),
            RouterError::InternalError(msg) => {
                ("Internal Server Error".to_string(), Some(msg.clone()))
            }
            RouterError::BadRequest(msg) => ("Bad Request".to_string(), Some(msg.clone())),
            RouterError::NotFound(msg) => ("Not Found".to_string(), Some(msg.clone())),
        };

        let error_response = handlers::error_response(status, message, details);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|e| {
            format!(
                "{{\"success\":false,\"error\":{{\"code\":\"500\",\"message\":\"Failed to serialize error: {}\"}}}}",
                e
            )
            .into_bytes()
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Bytes::from(body))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Bytes::from("Internal Server Error"));
                *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}
