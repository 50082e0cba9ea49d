use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;

use super::{RecordStore, StoreError};
use crate::search::filter::{Collection, RecordQuery, SortOrder};

/// In-process record store. Evaluates [`RecordQuery`] with the same
/// semantics as the PostgREST adapter.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<Collection, Vec<Value>>>,
}

/// On-disk seed layout: `{"assets": [...], "boards": [...]}`
#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    assets: Vec<Value>,
    #[serde(default)]
    boards: Vec<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_seed(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: Seed = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

        let store = Self::new();
        store.insert(Collection::Assets, seed.assets);
        store.insert(Collection::Boards, seed.boards);
        Ok(store)
    }

    pub fn insert(&self, collection: Collection, rows: Vec<Value>) {
        self.rows.write().entry(collection).or_default().extend(rows);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.rows.read().get(&collection).map_or(0, Vec::len)
    }
}

fn created_at(row: &Value) -> Option<DateTime<Utc>> {
    row.get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Value>, StoreError> {
        let mut rows: Vec<Value> = {
            let all = self.rows.read();
            all.get(&query.collection)
                .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
                .unwrap_or_default()
        };

        if let Some(SortOrder::CreatedDesc) = query.order {
            // Rows without a timestamp sort last, matching `nullslast` on desc
            rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}
