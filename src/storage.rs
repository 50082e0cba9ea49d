use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::config::{StorageConfig, UrlMode};

pub const ASSETS_BUCKET: &str = "assets";
pub const BOARDS_BUCKET: &str = "boards";
pub const BOARD_COVERS_BUCKET: &str = "boards_covers";

/// Image URL resolution against the object-storage service.
pub struct ObjectStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

/// Trim, strip leading slashes, percent-encode each path segment.
pub fn encode_path(path: &str) -> Option<String> {
    let clean = path.trim().trim_start_matches('/');
    if clean.is_empty() {
        return None;
    }
    let encoded: Vec<String> = clean
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    Some(encoded.join("/"))
}

impl ObjectStorage {
    pub fn new(client: reqwest::Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Stable public URL: `{base}/storage/v1/object/public/{bucket}/{path}`.
    pub fn public_url(&self, bucket: &str, path: Option<&str>) -> Option<String> {
        let base = self.config.base_url.as_deref()?;
        let encoded = encode_path(path?)?;
        Some(format!("{base}/storage/v1/object/public/{bucket}/{encoded}"))
    }

    /// Ask the storage service for a time-limited URL. Absolute paths pass
    /// through untouched; failures resolve to `None`.
    pub async fn signed_url(&self, bucket: &str, path: Option<&str>) -> Option<String> {
        let path = path?.trim().trim_start_matches('/');
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        let base = self.config.base_url.as_deref()?;
        let encoded = encode_path(path)?;
        let url = format!("{base}/storage/v1/object/sign/{bucket}/{encoded}");

        let mut req = self.client.post(&url).json(&SignRequest {
            expires_in: self.config.signed_url_ttl_secs,
        });
        if let Some(key) = &self.config.service_key {
            req = req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Signing {bucket}/{path} failed: {e}");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::warn!("Signing {bucket}/{path} returned {}", resp.status());
            return None;
        }
        match resp.json::<SignResponse>().await {
            Ok(body) => Some(format!("{base}/storage/v1{}", body.signed_url)),
            Err(e) => {
                tracing::warn!("Unreadable signing response for {bucket}/{path}: {e}");
                None
            }
        }
    }

    /// Resolve one path using the configured URL mode.
    pub async fn resolve(&self, bucket: &str, path: Option<&str>) -> Option<String> {
        match self.config.url_mode {
            UrlMode::Public => self.public_url(bucket, path),
            UrlMode::Signed => self.signed_url(bucket, path).await,
        }
    }

    /// Resolve a page of paths. Signing calls are independent and run
    /// concurrently; output order matches input order.
    pub async fn resolve_all(&self, bucket: &str, paths: &[Option<String>]) -> Vec<Option<String>> {
        join_all(paths.iter().map(|p| self.resolve(bucket, p.as_deref()))).await
    }
}
