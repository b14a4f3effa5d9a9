//! Storage abstractions for service layer
//!
//! Contains reusable file-backed stores used by the document replica.

pub mod json_map_store;
