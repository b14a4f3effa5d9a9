//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` to keep binary crates importing
//! `service::runtime` without depending directly on `common`.

/// Make sure the document store's directory exists before it is opened.
pub async fn ensure_document_dir(document_path: &str) -> anyhow::Result<()> {
    common::env::ensure_data_dir(document_path).await
}
