use async_trait::async_trait;
use serde_json::Value;

use super::{RecordStore, StoreError};
use crate::search::filter::RecordQuery;

/// Record store backed by a PostgREST endpoint (e.g. Supabase `/rest/v1`).
pub struct PostgrestStore {
    client: reqwest::Client,
    rest_url: String,
    api_key: Option<String>,
}

impl PostgrestStore {
    pub fn new(client: reqwest::Client, rest_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            rest_url: rest_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn select(&self, query: &RecordQuery) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/{}", self.rest_url, query.collection.table());

        let mut req = self.client.get(&url).query(&query.to_params());
        if let Some(key) = &self.api_key {
            req = req
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let rows: Vec<Value> = resp.json().await?;
        tracing::debug!(
            "PostgREST {} returned {} rows",
            query.collection.table(),
            rows.len()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filter::{Collection, Predicate, SortOrder};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_select_sends_filters_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/assets"))
            .and(query_param("status", "eq.ready"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "10"))
            .and(header("apikey", "anon"))
            .and(header("Authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a"}])))
            .expect(1)
            .mount(&server)
            .await;

        let store = PostgrestStore::new(
            reqwest::Client::new(),
            format!("{}/rest/v1/", server.uri()),
            Some("anon".into()),
        );
        let query = RecordQuery::new(Collection::Assets)
            .filter(Predicate::eq("status", "ready"))
            .order(SortOrder::CreatedDesc)
            .limit(10);

        let rows = store.select(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/boards"))
            .respond_with(ResponseTemplate::new(400).set_body_string("column does not exist"))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(
            reqwest::Client::new(),
            format!("{}/rest/v1", server.uri()),
            None,
        );
        let err = store
            .select(&RecordQuery::new(Collection::Boards))
            .await
            .unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("column"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
