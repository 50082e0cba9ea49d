//! Read-only access to the hosted record store.
//!
//! [`RecordStore`] is the seam: [`postgrest::PostgrestStore`] talks to a
//! PostgREST (Supabase) endpoint over HTTP, [`memory::MemoryStore`] evaluates
//! the same [`RecordQuery`] in process.

pub mod memory;
pub mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

use crate::search::filter::RecordQuery;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("record store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode record: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a filtered, ordered, limited select and return raw rows.
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Value>, StoreError>;
}
