//! Store adapters: `seaorm` backs the primary replica, `document` the secondary.

pub mod document;
pub mod seaorm;

pub use document::DocumentTodoStore;
pub use seaorm::SeaOrmTodoStore;
