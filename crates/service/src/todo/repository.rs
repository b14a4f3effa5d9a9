use async_trait::async_trait;

use super::domain::Todo;
use crate::errors::ServiceError;

/// Contract shared by both replicas. Records are keyed by `Todo::id`.
///
/// Implementations must return `Err` on storage problems rather than silently
/// doing nothing.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError>;
    /// Create or replace; returns the representation the store actually kept.
    async fn save(&self, todo: Todo) -> Result<Todo, ServiceError>;
    async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError>;
}

/// Simple in-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex, MutexGuard};

    /// Operations that can be made to fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StoreOp { FindAll, FindById, Save, Delete }

    /// Shared call log, entries look like `"secondary:save:<id>"`.
    pub type Journal = Arc<Mutex<Vec<String>>>;

    pub struct InMemoryTodoStore {
        name: String,
        rows: Mutex<Vec<Todo>>, // insertion order
        failing: Mutex<HashSet<StoreOp>>,
        journal: Journal,
        normalize: fn(Todo) -> Todo,
    }

    impl Default for InMemoryTodoStore {
        fn default() -> Self { Self::named("memory") }
    }

    fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    impl InMemoryTodoStore {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                rows: Mutex::new(Vec::new()),
                failing: Mutex::new(HashSet::new()),
                journal: Journal::default(),
                normalize: |t| t,
            }
        }

        /// Log calls into a journal shared with other stores.
        pub fn with_journal(mut self, journal: Journal) -> Self {
            self.journal = journal;
            self
        }

        /// Rewrite records on save, standing in for store-specific normalization.
        pub fn with_normalizer(mut self, normalize: fn(Todo) -> Todo) -> Self {
            self.normalize = normalize;
            self
        }

        /// Seed a record directly, bypassing failure injection and the journal.
        pub fn seed(&self, todo: Todo) {
            let mut rows = lock(&self.rows);
            rows.retain(|t| t.id != todo.id);
            rows.push(todo);
        }

        pub fn fail_on(&self, op: StoreOp) { lock(&self.failing).insert(op); }

        pub fn recover(&self, op: StoreOp) { lock(&self.failing).remove(&op); }

        pub fn contains(&self, id: &str) -> bool { lock(&self.rows).iter().any(|t| t.id == id) }

        pub fn get(&self, id: &str) -> Option<Todo> { lock(&self.rows).iter().find(|t| t.id == id).cloned() }

        pub fn len(&self) -> usize { lock(&self.rows).len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }

        pub fn journal(&self) -> Vec<String> { lock(&self.journal).clone() }

        fn enter(&self, op: StoreOp, id: Option<&str>) -> Result<(), ServiceError> {
            let label = match op {
                StoreOp::FindAll => "find_all",
                StoreOp::FindById => "find_by_id",
                StoreOp::Save => "save",
                StoreOp::Delete => "delete",
            };
            let entry = match id {
                Some(id) => format!("{}:{}:{}", self.name, label, id),
                None => format!("{}:{}", self.name, label),
            };
            lock(&self.journal).push(entry);
            if lock(&self.failing).contains(&op) {
                return Err(ServiceError::Db(format!("{} unavailable during {}", self.name, label)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TodoStore for InMemoryTodoStore {
        async fn find_all(&self) -> Result<Vec<Todo>, ServiceError> {
            self.enter(StoreOp::FindAll, None)?;
            Ok(lock(&self.rows).clone())
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
            self.enter(StoreOp::FindById, Some(id))?;
            Ok(self.get(id))
        }

        async fn save(&self, todo: Todo) -> Result<Todo, ServiceError> {
            self.enter(StoreOp::Save, Some(&todo.id))?;
            let stored = (self.normalize)(todo);
            let mut rows = lock(&self.rows);
            match rows.iter_mut().find(|t| t.id == stored.id) {
                Some(slot) => *slot = stored.clone(),
                None => rows.push(stored.clone()),
            }
            Ok(stored)
        }

        async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError> {
            self.enter(StoreOp::Delete, Some(id))?;
            lock(&self.rows).retain(|t| t.id != id);
            Ok(())
        }
    }
}
