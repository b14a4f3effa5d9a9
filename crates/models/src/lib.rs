//! Relational persistence for todos: the `todo` entity and connection helpers.

pub mod errors;
pub mod db;
pub mod todo;

#[cfg(test)]
mod tests;
