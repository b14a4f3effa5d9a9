use sea_orm::DatabaseConnection;
use tracing::debug;

use crate::errors::ServiceError;
use crate::todo::domain::Todo;
use crate::todo::repository::TodoStore;

/// Relational replica backed by the `todo` table.
///
/// `save` upserts: an existing row keeps its stored `created_at`.
pub struct SeaOrmTodoStore {
    pub db: DatabaseConnection,
}

impl SeaOrmTodoStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

impl From<models::todo::Model> for Todo {
    fn from(m: models::todo::Model) -> Self {
        Todo { id: m.id, title: m.title, completed: m.completed, created_at: m.created_at }
    }
}

#[async_trait::async_trait]
impl TodoStore for SeaOrmTodoStore {
    async fn find_all(&self) -> Result<Vec<Todo>, ServiceError> {
        let rows = models::todo::list(&self.db).await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        Ok(models::todo::get(&self.db, id).await?.map(Todo::from))
    }

    async fn save(&self, todo: Todo) -> Result<Todo, ServiceError> {
        let row = models::todo::upsert(&self.db, &todo.id, &todo.title, todo.completed, todo.created_at).await?;
        debug!(id = %row.id, "relational row upserted");
        Ok(row.into())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError> {
        let removed = models::todo::delete(&self.db, id).await?;
        debug!(%id, removed, "relational row delete");
        Ok(())
    }
}
