use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::domain::{Todo, TodoDraft};
use super::policy::{ReconcilePolicy, StoreRole};
use super::repository::TodoStore;
use crate::errors::ServiceError;

/// Single CRUD surface over the primary and secondary replicas.
///
/// Each call runs its store operations one after the other and stops at the
/// first failure. Nothing is rolled back: a write that succeeded on the
/// preferred store before the other store failed stays where it is.
pub struct TodoService {
    primary: Arc<dyn TodoStore>,
    secondary: Arc<dyn TodoStore>,
    policy: ReconcilePolicy,
}

impl TodoService {
    pub fn new(primary: Arc<dyn TodoStore>, secondary: Arc<dyn TodoStore>) -> Self {
        Self::with_policy(primary, secondary, ReconcilePolicy::DEFAULT)
    }

    pub fn with_policy(primary: Arc<dyn TodoStore>, secondary: Arc<dyn TodoStore>, policy: ReconcilePolicy) -> Self {
        Self { primary, secondary, policy }
    }

    fn store(&self, role: StoreRole) -> &dyn TodoStore {
        match role {
            StoreRole::Primary => self.primary.as_ref(),
            StoreRole::Secondary => self.secondary.as_ref(),
        }
    }

    /// Union of both stores, deduplicated by id.
    ///
    /// The listing winner is enumerated first and keeps its copy of any id both
    /// stores hold; the other copy is dropped without comparing fields.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Todo>, ServiceError> {
        let first = self.policy.listing_winner;
        let second = first.other();
        let winners = self.store(first).find_all().await.map_err(|e| e.in_store(first))?;
        let others = self.store(second).find_all().await.map_err(|e| e.in_store(second))?;

        let mut seen = HashSet::with_capacity(winners.len() + others.len());
        let mut merged = Vec::with_capacity(winners.len() + others.len());
        let mut dropped = 0usize;
        for todo in winners.into_iter().chain(others) {
            if seen.insert(todo.id.clone()) {
                merged.push(todo);
            } else {
                dropped += 1;
            }
        }
        debug!(count = merged.len(), dropped, winner = %first, "merged listings");
        Ok(merged)
    }

    /// Look up the preferred store first; fall back to the other only on a miss.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Todo>, ServiceError> {
        let first = self.policy.preferred;
        if let Some(todo) = self.store(first).find_by_id(id).await.map_err(|e| e.in_store(first))? {
            debug!(store = %first, "found");
            return Ok(Some(todo));
        }
        let second = first.other();
        let found = self.store(second).find_by_id(id).await.map_err(|e| e.in_store(second))?;
        debug!(store = %second, hit = found.is_some(), "fallback lookup");
        Ok(found)
    }

    /// Persist a new todo in both stores.
    ///
    /// The draft is completed (id, `created_at`) before the first write. The
    /// returned record is what the non-preferred store kept.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::todo::{TodoDraft, TodoService};
    /// use service::todo::repository::mock::InMemoryTodoStore;
    /// let primary = Arc::new(InMemoryTodoStore::named("primary"));
    /// let secondary = Arc::new(InMemoryTodoStore::named("secondary"));
    /// let svc = TodoService::new(primary.clone(), secondary.clone());
    /// let saved = tokio_test::block_on(svc.save(TodoDraft::new("Buy milk", false))).unwrap();
    /// assert!(!saved.id.is_empty());
    /// assert!(primary.contains(&saved.id) && secondary.contains(&saved.id));
    /// ```
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn save(&self, draft: TodoDraft) -> Result<Todo, ServiceError> {
        let todo = draft.into_todo(Utc::now());
        let stored = self.write_through(todo).await?;
        info!(id = %stored.id, "todo_saved");
        Ok(stored)
    }

    /// Write an existing todo to both stores. Existence is not checked here.
    #[instrument(skip(self, todo), fields(id = %todo.id))]
    pub async fn update(&self, todo: Todo) -> Result<Todo, ServiceError> {
        let stored = self.write_through(todo).await?;
        info!(id = %stored.id, completed = stored.completed, "todo_updated");
        Ok(stored)
    }

    /// Delete from the preferred store, then the other. No existence check.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<(), ServiceError> {
        let first = self.policy.preferred;
        let second = first.other();
        self.store(first).delete_by_id(id).await.map_err(|e| e.in_store(first))?;
        if let Err(e) = self.store(second).delete_by_id(id).await {
            warn!(%id, deleted_from = %first, still_in = %second, error = %e, "delete left replicas divergent");
            return Err(e.in_store(second));
        }
        info!(%id, "todo_deleted");
        Ok(())
    }

    /// Preferred store first; the other store receives the preferred store's
    /// result, not the caller's value.
    async fn write_through(&self, todo: Todo) -> Result<Todo, ServiceError> {
        let first = self.policy.preferred;
        let second = first.other();
        let id = todo.id.clone();
        let kept = self.store(first).save(todo).await.map_err(|e| e.in_store(first))?;
        match self.store(second).save(kept).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                warn!(%id, written_to = %first, missing_from = %second, error = %e, "write left replicas divergent");
                Err(e.in_store(second))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::repository::mock::{InMemoryTodoStore, Journal, StoreOp};
    use chrono::Duration;

    struct Fixture {
        primary: Arc<InMemoryTodoStore>,
        secondary: Arc<InMemoryTodoStore>,
        journal: Journal,
        svc: TodoService,
    }

    fn fixture_with(policy: ReconcilePolicy) -> Fixture {
        let journal = Journal::default();
        let primary = Arc::new(InMemoryTodoStore::named("primary").with_journal(journal.clone()));
        let secondary = Arc::new(InMemoryTodoStore::named("secondary").with_journal(journal.clone()));
        let svc = TodoService::with_policy(primary.clone(), secondary.clone(), policy);
        Fixture { primary, secondary, journal, svc }
    }

    fn fixture() -> Fixture { fixture_with(ReconcilePolicy::DEFAULT) }

    fn entries(journal: &Journal) -> Vec<String> { journal.lock().unwrap().clone() }

    fn todo(id: &str, title: &str) -> Todo {
        TodoDraft { id: Some(id.into()), ..TodoDraft::new(title, false) }.into_todo(Utc::now())
    }

    #[tokio::test]
    async fn save_then_find_by_id_round_trips() -> anyhow::Result<()> {
        let f = fixture();
        let saved = f.svc.save(TodoDraft::new("Write tests", true)).await?;
        let found = f.svc.find_by_id(&saved.id).await?.expect("present");
        assert_eq!(found.title, "Write tests");
        assert!(found.completed);
        Ok(())
    }

    #[tokio::test]
    async fn save_generates_id_and_created_at() -> anyhow::Result<()> {
        let f = fixture();
        let before = Utc::now() - Duration::milliseconds(1);
        let saved = f.svc.save(TodoDraft::new("Buy milk", false)).await?;
        let after = Utc::now();
        assert!(uuid::Uuid::parse_str(&saved.id).is_ok());
        assert!(saved.created_at >= before && saved.created_at <= after);
        assert_eq!(f.primary.get(&saved.id), Some(saved.clone()));
        assert_eq!(f.secondary.get(&saved.id), Some(saved));
        Ok(())
    }

    #[tokio::test]
    async fn save_writes_secondary_then_primary() -> anyhow::Result<()> {
        let f = fixture();
        let saved = f.svc.save(TodoDraft::new("ordered", false)).await?;
        assert_eq!(
            entries(&f.journal),
            vec![format!("secondary:save:{}", saved.id), format!("primary:save:{}", saved.id)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn save_returns_primary_result_of_secondary_output() -> anyhow::Result<()> {
        let journal = Journal::default();
        let secondary = Arc::new(
            InMemoryTodoStore::named("secondary")
                .with_journal(journal.clone())
                .with_normalizer(|mut t| { t.title = t.title.trim().to_string(); t }),
        );
        let primary = Arc::new(
            InMemoryTodoStore::named("primary")
                .with_journal(journal)
                .with_normalizer(|mut t| { t.title = t.title.to_uppercase(); t }),
        );
        let svc = TodoService::new(primary.clone(), secondary.clone());

        let saved = svc.save(TodoDraft::new("  milk  ", false)).await?;
        // primary saw the secondary's trimmed copy and uppercased it
        assert_eq!(saved.title, "MILK");
        assert_eq!(secondary.get(&saved.id).map(|t| t.title), Some("milk".to_string()));
        assert_eq!(primary.get(&saved.id).map(|t| t.title), Some("MILK".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn secondary_failure_skips_primary_write() -> anyhow::Result<()> {
        let f = fixture();
        f.secondary.fail_on(StoreOp::Save);
        let draft = TodoDraft { id: Some("doomed".into()), ..TodoDraft::new("never stored", false) };

        let err = f.svc.save(draft).await.unwrap_err();
        assert_eq!(err.store(), Some(StoreRole::Secondary));
        assert!(!f.primary.contains("doomed"));
        assert!(!f.secondary.contains("doomed"));
        assert_eq!(entries(&f.journal), vec!["secondary:save:doomed".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn primary_failure_leaves_secondary_only_record() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.fail_on(StoreOp::Save);
        let draft = TodoDraft { id: Some("dangling".into()), ..TodoDraft::new("half written", false) };

        let err = f.svc.save(draft).await.unwrap_err();
        assert_eq!(err.store(), Some(StoreRole::Primary));
        assert!(f.secondary.contains("dangling"));
        assert!(!f.primary.contains("dangling"));
        // the dangling copy is still visible through the service
        assert!(f.svc.find_by_id("dangling").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn update_uses_same_write_order_without_existence_check() -> anyhow::Result<()> {
        let f = fixture();
        let ghost = todo("ghost", "never saved");
        let stored = f.svc.update(ghost.clone()).await?;
        assert_eq!(stored, ghost);
        assert_eq!(
            entries(&f.journal),
            vec!["secondary:save:ghost".to_string(), "primary:save:ghost".to_string()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_secondary_failure_leaves_primary_untouched() -> anyhow::Result<()> {
        let f = fixture();
        let original = f.svc.save(TodoDraft::new("stable", false)).await?;
        f.secondary.fail_on(StoreOp::Save);

        let mut changed = original.clone();
        changed.apply_changes("changed", true);
        assert!(f.svc.update(changed).await.is_err());
        assert_eq!(f.primary.get(&original.id), Some(original));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_prefers_secondary() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.seed(todo("shared", "from primary"));
        f.secondary.seed(todo("shared", "from secondary"));

        let found = f.svc.find_by_id("shared").await?.expect("present");
        assert_eq!(found.title, "from secondary");
        // primary never consulted on a secondary hit
        assert_eq!(entries(&f.journal), vec!["secondary:find_by_id:shared".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_falls_back_to_primary() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.seed(todo("only-primary", "legacy"));
        let found = f.svc.find_by_id("only-primary").await?.expect("present");
        assert_eq!(found.title, "legacy");
        assert!(f.svc.find_by_id("nowhere").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_propagates_secondary_failure() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.seed(todo("x", "reachable"));
        f.secondary.fail_on(StoreOp::FindById);
        let err = f.svc.find_by_id("x").await.unwrap_err();
        assert_eq!(err.store(), Some(StoreRole::Secondary));
        Ok(())
    }

    #[tokio::test]
    async fn flipped_policy_prefers_primary() -> anyhow::Result<()> {
        let f = fixture_with(ReconcilePolicy::DEFAULT.flipped());
        f.primary.seed(todo("shared", "from primary"));
        f.secondary.seed(todo("shared", "from secondary"));
        assert_eq!(f.svc.find_by_id("shared").await?.map(|t| t.title), Some("from primary".into()));
        assert_eq!(f.svc.find_all().await?[0].title, "from secondary");

        let saved = f.svc.save(TodoDraft::new("flip", false)).await?;
        let log = entries(&f.journal);
        let saves: Vec<&String> = log.iter().filter(|e| e.contains(":save:")).collect();
        assert_eq!(saves, vec![&format!("primary:save:{}", saved.id), &format!("secondary:save:{}", saved.id)]);
        Ok(())
    }

    #[tokio::test]
    async fn find_all_returns_every_distinct_id() -> anyhow::Result<()> {
        let f = fixture();
        for i in 0..5 {
            f.svc.save(TodoDraft::new(format!("todo {i}"), i % 2 == 0)).await?;
        }
        assert_eq!(f.svc.find_all().await?.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn find_all_unions_and_keeps_primary_copy() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.seed(todo("a", "primary a"));
        f.primary.seed(todo("shared", "primary shared"));
        f.secondary.seed(todo("shared", "secondary shared"));
        f.secondary.seed(todo("b", "secondary b"));

        let all = f.svc.find_all().await?;
        assert_eq!(all.len(), 3);
        let shared = all.iter().find(|t| t.id == "shared").expect("shared present");
        assert_eq!(shared.title, "primary shared");
        assert!(all.iter().any(|t| t.id == "b"));
        Ok(())
    }

    #[tokio::test]
    async fn find_all_fails_if_either_store_fails() -> anyhow::Result<()> {
        let f = fixture();
        f.primary.seed(todo("a", "a"));
        f.secondary.fail_on(StoreOp::FindAll);
        let err = f.svc.find_all().await.unwrap_err();
        assert_eq!(err.store(), Some(StoreRole::Secondary));
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_from_both_in_order() -> anyhow::Result<()> {
        let f = fixture();
        let saved = f.svc.save(TodoDraft::new("bye", false)).await?;
        f.journal.lock().unwrap().clear();

        f.svc.delete_by_id(&saved.id).await?;
        assert_eq!(
            entries(&f.journal),
            vec![format!("secondary:delete:{}", saved.id), format!("primary:delete:{}", saved.id)]
        );
        assert!(f.svc.find_by_id(&saved.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_of_missing_id_is_not_checked() -> anyhow::Result<()> {
        let f = fixture();
        f.svc.delete_by_id("missing").await?;
        assert_eq!(entries(&f.journal).len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failed_primary_delete_leaves_primary_copy() -> anyhow::Result<()> {
        let f = fixture();
        let saved = f.svc.save(TodoDraft::new("stubborn", false)).await?;
        f.primary.fail_on(StoreOp::Delete);

        let err = f.svc.delete_by_id(&saved.id).await.unwrap_err();
        assert_eq!(err.store(), Some(StoreRole::Primary));
        assert!(!f.secondary.contains(&saved.id));
        assert!(f.primary.contains(&saved.id));
        // still reachable through the primary fallback
        assert!(f.svc.find_by_id(&saved.id).await?.is_some());

        f.primary.recover(StoreOp::Delete);
        f.svc.delete_by_id(&saved.id).await?;
        assert!(f.svc.find_by_id(&saved.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn failed_secondary_delete_touches_nothing() -> anyhow::Result<()> {
        let f = fixture();
        let saved = f.svc.save(TodoDraft::new("kept", false)).await?;
        f.secondary.fail_on(StoreOp::Delete);
        assert!(f.svc.delete_by_id(&saved.id).await.is_err());
        assert!(f.secondary.contains(&saved.id));
        assert!(f.primary.contains(&saved.id));
        Ok(())
    }

    #[tokio::test]
    async fn buy_milk_lifecycle() -> anyhow::Result<()> {
        let f = fixture();
        let created = f.svc.save(TodoDraft::new("Buy milk", false)).await?;
        assert!(!created.id.is_empty());
        assert!(!created.completed);

        let mut done = created.clone();
        done.apply_changes("Buy milk", true);
        f.svc.update(done).await?;

        let found = f.svc.find_by_id(&created.id).await?.expect("present");
        assert!(found.completed);
        assert_eq!(found.id, created.id);
        assert_eq!(found.created_at, created.created_at);

        f.svc.delete_by_id(&created.id).await?;
        assert!(f.svc.find_by_id(&created.id).await?.is_none());
        assert!(f.primary.is_empty());
        assert!(f.secondary.is_empty());
        Ok(())
    }
}
