//! Shared plumbing for the todo backend crates: logging setup, startup
//! environment checks and small HTTP payload types.

pub mod types;
pub mod utils;
pub mod env;
