use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const TITLE_MAX_LEN: usize = 255;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation { fn def(&self) -> RelationDef { panic!("no relations") } }

impl ActiveModelBehavior for ActiveModel {}

/// Titles must be non-blank and fit the column.
pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title cannot be empty".into()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ModelError::Validation(format!("title longer than {TITLE_MAX_LEN} characters")));
    }
    Ok(())
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_asc(Column::CreatedAt).all(db).await?)
}

pub async fn get(db: &DatabaseConnection, id: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id.to_string()).one(db).await?)
}

/// Insert a new row, or update `title`/`completed` of an existing one.
///
/// `created_at` is only written on insert; an existing row keeps its value.
pub async fn upsert(
    db: &DatabaseConnection,
    id: &str,
    title: &str,
    completed: bool,
    created_at: DateTimeUtc,
) -> Result<Model, ModelError> {
    validate_title(title)?;
    match get(db, id).await? {
        Some(existing) => {
            let mut am: ActiveModel = existing.into();
            am.title = Set(title.to_string());
            am.completed = Set(completed);
            Ok(am.update(db).await?)
        }
        None => {
            let am = ActiveModel {
                id: Set(id.to_string()),
                title: Set(title.to_string()),
                completed: Set(completed),
                created_at: Set(created_at),
            };
            Ok(am.insert(db).await?)
        }
    }
}

/// Delete by id; returns whether a row was removed.
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id.to_string()).exec(db).await?;
    Ok(res.rows_affected > 0)
}
