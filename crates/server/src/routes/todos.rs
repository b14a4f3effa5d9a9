use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use service::errors::ServiceError;
use service::todo::{Todo, TodoDraft};

use crate::{errors::JsonApiError, routes::ServerState};

/// Request body for create and update. Client-sent `id`/`createdAt` are ignored.
#[derive(Debug, Deserialize)]
pub struct TodoInput {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoInput {
    fn validate(self) -> Result<(String, bool), JsonApiError> {
        let title = self.title.ok_or_else(|| JsonApiError::validation("title cannot be empty"))?;
        models::todo::validate_title(&title).map_err(|e| JsonApiError::validation(e.to_string()))?;
        let completed = self.completed.ok_or_else(|| JsonApiError::validation("completed status cannot be null"))?;
        Ok((title, completed))
    }
}

fn parse_body(body: Result<Json<TodoInput>, JsonRejection>) -> Result<(String, bool), JsonApiError> {
    let Json(input) = body.map_err(|e| JsonApiError::validation(e.body_text()))?;
    input.validate()
}

fn internal(action: &'static str, e: ServiceError) -> JsonApiError {
    error!(error = %e, store = ?e.store(), action, "todo operation failed");
    JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, action, Some(e.to_string()))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Todo>>, JsonApiError> {
    let todos = state.todos.find_all().await.map_err(|e| internal("List Failed", e))?;
    info!(count = todos.len(), "list todos");
    Ok(Json(todos))
}

pub async fn create(
    State(state): State<ServerState>,
    body: Result<Json<TodoInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), JsonApiError> {
    let (title, completed) = parse_body(body)?;
    let saved = state
        .todos
        .save(TodoDraft::new(title, completed))
        .await
        .map_err(|e| internal("Create Failed", e))?;
    info!(id = %saved.id, "created todo");
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Todo>, JsonApiError> {
    match state.todos.find_by_id(&id).await.map_err(|e| internal("Lookup Failed", e))? {
        Some(todo) => Ok(Json(todo)),
        None => {
            warn!(%id, "todo not found");
            Err(JsonApiError::not_found(&id))
        }
    }
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<Todo>, JsonApiError> {
    let (title, completed) = parse_body(body)?;
    let Some(mut existing) = state.todos.find_by_id(&id).await.map_err(|e| internal("Lookup Failed", e))? else {
        warn!(%id, "todo not found for update");
        return Err(JsonApiError::not_found(&id));
    };
    existing.apply_changes(title, completed);
    let updated = state.todos.update(existing).await.map_err(|e| internal("Update Failed", e))?;
    info!(%id, "updated todo");
    Ok(Json(updated))
}

pub async fn remove(State(state): State<ServerState>, Path(id): Path<String>) -> Result<StatusCode, JsonApiError> {
    if state.todos.find_by_id(&id).await.map_err(|e| internal("Lookup Failed", e))?.is_none() {
        warn!(%id, "todo not found for deletion");
        return Err(JsonApiError::not_found(&id));
    }
    state.todos.delete_by_id(&id).await.map_err(|e| internal("Delete Failed", e))?;
    info!(%id, "deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
