use std::{path::PathBuf, sync::Arc};

use tracing::debug;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::todo::domain::Todo;
use crate::todo::repository::TodoStore;

/// Document replica: each todo is one JSON document keyed by id, persisted
/// to a single file. `save` replaces the whole document.
#[derive(Clone)]
pub struct DocumentTodoStore {
    docs: Arc<JsonMapStore<String, Todo>>,
}

impl DocumentTodoStore {
    /// Open (or create) the document file at `path`.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let docs = JsonMapStore::<String, Todo>::new(path).await?;
        Ok(Self { docs })
    }
}

#[async_trait::async_trait]
impl TodoStore for DocumentTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, ServiceError> {
        let mut all: Vec<Todo> = self.docs.list().await.into_iter().map(|(_, doc)| doc).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        Ok(self.docs.get(&id.to_string()).await)
    }

    async fn save(&self, todo: Todo) -> Result<Todo, ServiceError> {
        self.docs.insert(todo.id.clone(), todo.clone()).await?;
        debug!(id = %todo.id, "document replaced");
        Ok(todo)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError> {
        let removed = self.docs.remove(&id.to_string()).await?;
        debug!(%id, removed, "document delete");
        Ok(())
    }
}
