use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Record store (PostgREST / Supabase) settings
    pub store: StoreConfig,
    /// Object storage settings for image URLs
    pub storage: StorageConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project base URL, e.g. "https://xyz.supabase.co". REST lives under `/rest/v1`.
    pub base_url: Option<String>,
    /// Key sent as both `apikey` and bearer token
    pub api_key: Option<String>,
    /// JSON seed for the in-memory store, used when no base URL is set
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrlMode {
    /// Stable public URLs built from the base URL
    Public,
    /// Time-limited signed URLs issued per object
    Signed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage base URL. Defaults to the store base URL.
    pub base_url: Option<String>,
    pub url_mode: UrlMode,
    /// Lifetime of signed URLs in seconds
    pub signed_url_ttl_secs: u64,
    /// Service key used for signing requests
    pub service_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for interpretation
    pub chat_model: String,
    /// API key (required for the openai provider)
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            store: StoreConfig::default(),
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            url_mode: UrlMode::Public,
            signed_url_ttl_secs: 60 * 60,
            service_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o".to_string(),
            api_key: None,
            temperature: 0.4,
        }
    }
}

impl LlmConfig {
    /// Name of the environment variable holding the credential this provider
    /// needs, if any.
    pub fn credential_var(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    /// Returns the missing credential's variable name when the provider
    /// requires a key that was not configured.
    pub fn missing_credential(&self) -> Option<&'static str> {
        match (self.credential_var(), self.api_key.as_deref()) {
            (Some(var), None) => Some(var),
            (Some(var), Some(key)) if key.trim().is_empty() => Some(var),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. `from_env` is the
    /// process-environment case.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("CURATOR_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(url) = lookup("SUPABASE_URL") {
            config.store.base_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            config.store.api_key = Some(key);
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_ROLE_KEY") {
            // Server-side reads may use the service role instead of anon
            config.store.api_key = Some(key.clone());
            config.storage.service_key = Some(key);
        }

        if let Some(path) = lookup("CURATOR_SEED_FILE").filter(|p| !p.is_empty()) {
            config.store.seed_file = Some(PathBuf::from(path));
        }

        config.storage.base_url = lookup("STORAGE_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .or_else(|| config.store.base_url.clone());
        if let Some(mode) = lookup("STORAGE_URL_MODE") {
            match mode.as_str() {
                "signed" => config.storage.url_mode = UrlMode::Signed,
                "public" => config.storage.url_mode = UrlMode::Public,
                other => tracing::warn!("Unknown STORAGE_URL_MODE '{other}', using public"),
            }
        }
        if let Some(val) = lookup("STORAGE_SIGNED_URL_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.storage.signed_url_ttl_secs = v;
            }
        }

        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
            if config.llm.provider == "ollama" && lookup("LLM_BASE_URL").is_none() {
                config.llm.base_url = "http://localhost:11434".to_string();
            }
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.is_empty()) {
            config.llm.chat_model = model;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty()) {
            config.llm.api_key = Some(key);
        }
        if let Some(val) = lookup("LLM_TEMPERATURE") {
            if let Ok(t) = val.parse::<f32>() {
                config.llm.temperature = t.clamp(0.0, 2.0);
            }
        }

        config
    }

    /// PostgREST endpoint, if a store is configured.
    pub fn rest_url(&self) -> Option<String> {
        self.store
            .base_url
            .as_ref()
            .map(|base| format!("{base}/rest/v1"))
    }
}
