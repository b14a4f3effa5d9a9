use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::todo::TodoService;

pub mod todos;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub todos: Arc<TodoService>,
}

impl ServerState {
    pub fn new(todos: TodoService) -> Self { Self { todos: Arc::new(todos) } }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health check plus the todo API.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/getTodos", get(todos::list))
        .route("/createTodo", post(todos::create))
        .route("/getTodo/:id", get(todos::get))
        .route("/updateTodo/:id", put(todos::update))
        .route("/deleteTodo/:id", delete(todos::remove));

    Router::new()
        .route("/health", get(health))
        .nest("/api/todos", api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx at ERROR
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
