//! Todo module: domain, store contract, store adapters and the reconciliation service.
//!
//! Every todo is replicated into two independent stores: a relational primary
//! and a document secondary. `TodoService` fans writes out to both and merges
//! reads. There is no transaction spanning the two stores; a failure between
//! the first and second write leaves the replicas divergent until the next
//! successful write of that id.

pub mod domain;
pub mod policy;
pub mod repository;
pub mod repo;
pub mod service;

pub use domain::{Todo, TodoDraft};
pub use policy::{ReconcilePolicy, StoreRole};
pub use repository::TodoStore;
pub use service::TodoService;
