//! Service layer for the dual-store todo backend.
//! - `todo` holds the domain type, the store contract and the reconciliation service.
//! - `storage` holds reusable file-backed stores.
//! - Store adapters translate persistence errors into `ServiceError`.

pub mod errors;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
pub mod storage;
pub mod todo;
