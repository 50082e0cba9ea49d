use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::llm::client::{ChatModel, HttpChatModel};
use crate::llm::interpret::Interpreter;
use crate::search::fetcher::Fetcher;
use crate::search::filter::Collection;
use crate::storage::ObjectStorage;
use crate::store::memory::MemoryStore;
use crate::store::postgrest::PostgrestStore;
use crate::store::RecordStore;

/// Shared application state. Everything in here is built once at startup
/// and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Fetcher,
    pub interpreter: Interpreter,
    pub storage: Arc<ObjectStorage>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        let store: Arc<dyn RecordStore> = match config.rest_url() {
            Some(rest_url) => Arc::new(PostgrestStore::new(
                http_client.clone(),
                rest_url,
                config.store.api_key.clone(),
            )),
            None => match &config.store.seed_file {
                Some(path) => {
                    let store = MemoryStore::load_seed(path)?;
                    tracing::info!(
                        "Loaded {} assets and {} boards from {}",
                        store.len(Collection::Assets),
                        store.len(Collection::Boards),
                        path.display()
                    );
                    Arc::new(store)
                }
                None => {
                    tracing::warn!("SUPABASE_URL not set; serving an empty in-memory catalog");
                    Arc::new(MemoryStore::new())
                }
            },
        };

        let model: Arc<dyn ChatModel> =
            Arc::new(HttpChatModel::new(http_client.clone(), config.llm.clone()));
        let storage = Arc::new(ObjectStorage::new(http_client, config.storage));

        Ok(Self::with_parts(store, model, storage))
    }

    /// Assemble state from already-built parts. Tests use this to swap in
    /// an in-memory store and a canned model.
    pub fn with_parts(
        store: Arc<dyn RecordStore>,
        model: Arc<dyn ChatModel>,
        storage: Arc<ObjectStorage>,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(store),
            interpreter: Interpreter::new(model),
            storage,
        }
    }
}
