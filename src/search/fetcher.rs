use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Asset, Board, SearchContext};
use crate::search::filter::{
    build_filters, Collection, FieldPlan, Predicate, RecordQuery, SortOrder, CURATE_FIELDS,
    LIBRARY_FIELDS, TREND_FIELDS,
};
use crate::search::rank::{rank_assets, RANKED_OVERFETCH};
use crate::store::{RecordStore, StoreError};

/// How rows are ordered and paged. A surface uses exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPolicy {
    /// Newest first; fetch `limit + 1` rows to detect more
    Recent,
    /// Over-fetch candidates, score by matched field, keep the best
    Ranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPlan {
    pub fields: FieldPlan,
    pub policy: RetrievalPolicy,
}

impl SearchPlan {
    /// Home/library browse: assets by recency, title-inclusive matching,
    /// restricted to the inferred domain.
    pub const LIBRARY: SearchPlan = SearchPlan {
        fields: FieldPlan {
            collection: Collection::Assets,
            text_fields: LIBRARY_FIELDS,
            restrict_domain: true,
            explicit_filters: false,
        },
        policy: RetrievalPolicy::Recent,
    };

    /// Curate search: assets re-ranked by field weights. Domain is a scored
    /// field here rather than a hard restriction.
    pub const CURATE: SearchPlan = SearchPlan {
        fields: FieldPlan {
            collection: Collection::Assets,
            text_fields: CURATE_FIELDS,
            restrict_domain: false,
            explicit_filters: false,
        },
        policy: RetrievalPolicy::Ranked,
    };

    /// Trend browse: boards by recency with explicit filters.
    pub const TREND: SearchPlan = SearchPlan {
        fields: FieldPlan {
            collection: Collection::Boards,
            text_fields: TREND_FIELDS,
            restrict_domain: false,
            explicit_filters: true,
        },
        policy: RetrievalPolicy::Recent,
    };
}

/// A fetched record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Asset(Asset),
    Board(Board),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub record: Record,
    /// Score from the ranked policy; `None` under recency ordering
    pub relevance: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    pub items: Vec<Hit>,
    pub has_more: bool,
}

impl ResultPage {
    pub fn assets(&self) -> impl Iterator<Item = (&Asset, Option<u32>)> {
        self.items.iter().filter_map(|h| match &h.record {
            Record::Asset(a) => Some((a, h.relevance)),
            Record::Board(_) => None,
        })
    }

    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.items.iter().filter_map(|h| match &h.record {
            Record::Board(b) => Some(b),
            Record::Asset(_) => None,
        })
    }
}

/// Runs search plans against the record store. Store failures never reach
/// the caller: they are logged and become empty results.
#[derive(Clone)]
pub struct Fetcher {
    store: Arc<dyn RecordStore>,
}

impl Fetcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, plan: &SearchPlan, ctx: &SearchContext, limit: usize) -> ResultPage {
        match self.try_fetch(plan, ctx, limit).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(
                    "Store error on {} search for '{}': {e}",
                    plan.fields.collection.table(),
                    ctx.raw_query
                );
                ResultPage::default()
            }
        }
    }

    async fn try_fetch(
        &self,
        plan: &SearchPlan,
        ctx: &SearchContext,
        limit: usize,
    ) -> Result<ResultPage, StoreError> {
        let mut query = RecordQuery::new(plan.fields.collection).order(SortOrder::CreatedDesc);
        query.filters = build_filters(&plan.fields, ctx);

        match plan.policy {
            RetrievalPolicy::Recent => {
                let rows = self.store.select(&query.limit(limit + 1)).await?;
                let has_more = rows.len() > limit;
                let items = decode_rows(plan.fields.collection, rows.into_iter().take(limit))
                    .into_iter()
                    .map(|record| Hit {
                        record,
                        relevance: None,
                    })
                    .collect();
                Ok(ResultPage { items, has_more })
            }
            RetrievalPolicy::Ranked => {
                let rows = self.store.select(&query.limit(RANKED_OVERFETCH)).await?;
                // Scoring is defined over asset note fields only
                let assets: Vec<Asset> = decode_each(Collection::Assets, rows);
                let items = rank_assets(assets, &ctx.tokens, limit)
                    .into_iter()
                    .map(|(a, score)| Hit {
                        record: Record::Asset(a),
                        relevance: Some(score),
                    })
                    .collect();
                Ok(ResultPage {
                    items,
                    has_more: false,
                })
            }
        }
    }

    /// Single asset by id. Errors are logged and read as "not found".
    pub async fn asset_by_id(&self, id: Uuid) -> Option<Asset> {
        let query = RecordQuery::new(Collection::Assets)
            .filter(Predicate::eq("id", &id.to_string()))
            .limit(1);
        self.first(query).await
    }

    /// Single board by slug. Errors are logged and read as "not found".
    pub async fn board_by_slug(&self, slug: &str) -> Option<Board> {
        let query = RecordQuery::new(Collection::Boards)
            .filter(Predicate::eq("slug", slug))
            .limit(1);
        self.first(query).await
    }

    async fn first<T: DeserializeOwned>(&self, query: RecordQuery) -> Option<T> {
        match self.try_first(&query).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!("Store error on {} lookup: {e}", query.collection.table());
                None
            }
        }
    }

    async fn try_first<T: DeserializeOwned>(
        &self,
        query: &RecordQuery,
    ) -> Result<Option<T>, StoreError> {
        let rows = self.store.select(query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}

/// Decode rows one at a time. A row that does not fit the record shape is
/// logged and skipped so the rest of the page still renders.
fn decode_each<T: DeserializeOwned>(collection: Collection, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {} row: {e}", collection.table());
                None
            }
        })
        .collect()
}

fn decode_rows(collection: Collection, rows: impl Iterator<Item = Value>) -> Vec<Record> {
    let rows: Vec<Value> = rows.collect();
    match collection {
        Collection::Assets => decode_each::<Asset>(collection, rows)
            .into_iter()
            .map(Record::Asset)
            .collect(),
        Collection::Boards => decode_each::<Board>(collection, rows)
            .into_iter()
            .map(Record::Board)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Filters;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn select(&self, _query: &RecordQuery) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    fn asset_row(n: u32, title: &str, domain: &str, extra: Value) -> Value {
        let mut row = json!({
            "id": format!("00000000-0000-0000-0000-{n:012}"),
            "title": title,
            "domain": domain,
            "status": "ready",
            "created_at": format!("2025-01-{:02}T00:00:00Z", n.min(28)),
        });
        if let (Some(obj), Value::Object(extra)) = (row.as_object_mut(), extra) {
            obj.extend(extra);
        }
        row
    }

    fn store_with(rows: Vec<Value>) -> Arc<dyn RecordStore> {
        let store = MemoryStore::new();
        store.insert(Collection::Assets, rows);
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_recent_sets_has_more_only_when_extra_row() {
        let rows = (1..=4).map(|n| asset_row(n, "Floral", "womenswear", json!({}))).collect();
        let fetcher = Fetcher::new(store_with(rows));
        let ctx = SearchContext::new("", Filters::default());

        let page = fetcher.fetch(&SearchPlan::LIBRARY, &ctx, 3).await;
        assert_eq!(page.items.len(), 3);
        assert!(page.has_more);

        let page = fetcher.fetch(&SearchPlan::LIBRARY, &ctx, 4).await;
        assert_eq!(page.items.len(), 4);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let rows = vec![
            asset_row(1, "Old", "menswear", json!({})),
            asset_row(9, "New", "menswear", json!({})),
        ];
        let fetcher = Fetcher::new(store_with(rows));
        let page = fetcher
            .fetch(&SearchPlan::LIBRARY, &SearchContext::new("", Filters::default()), 9)
            .await;
        let titles: Vec<_> = page.assets().map(|(a, _)| a.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_library_restricts_to_inferred_domain() {
        let rows = vec![
            asset_row(1, "Stripe", "menswear;womenswear", json!({})),
            asset_row(2, "Stripe", "interiors", json!({})),
        ];
        let fetcher = Fetcher::new(store_with(rows));
        let ctx = SearchContext::new("men's stripe", Filters::default());
        let page = fetcher.fetch(&SearchPlan::LIBRARY, &ctx, 9).await;
        assert_eq!(page.items.len(), 1);
        let (asset, relevance) = page.assets().next().unwrap();
        assert_eq!(asset.domain.as_deref(), Some("menswear;womenswear"));
        assert_eq!(relevance, None);
    }

    #[tokio::test]
    async fn test_ranked_orders_by_weight() {
        let rows = vec![
            asset_row(1, "A", "interiors", json!({"print_pattern_notes": "floral repeat"})),
            asset_row(2, "B", "interiors", json!({"direction": "floral romance"})),
            asset_row(3, "C", "floral", json!({})),
            asset_row(4, "D", "interiors", json!({"color_notes": "rose"})),
        ];
        let fetcher = Fetcher::new(store_with(rows));
        let ctx = SearchContext::new("floral", Filters::default());
        let page = fetcher.fetch(&SearchPlan::CURATE, &ctx, 9).await;

        let ranked: Vec<(String, Option<u32>)> = page
            .assets()
            .map(|(a, r)| (a.title.clone().unwrap(), r))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("C".to_string(), Some(40)),
                ("B".to_string(), Some(30)),
                ("A".to_string(), Some(10)),
            ]
        );
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_empty() {
        let fetcher = Fetcher::new(Arc::new(FailingStore));
        let ctx = SearchContext::new("floral", Filters::default());
        for plan in [SearchPlan::LIBRARY, SearchPlan::CURATE, SearchPlan::TREND] {
            let page = fetcher.fetch(&plan, &ctx, 9).await;
            assert!(page.items.is_empty());
            assert!(!page.has_more);
        }
        assert!(fetcher.board_by_slug("x").await.is_none());
        assert!(fetcher.asset_by_id(Uuid::nil()).await.is_none());
    }

    #[tokio::test]
    async fn test_trend_filters_boards() {
        let store = MemoryStore::new();
        store.insert(
            Collection::Boards,
            vec![
                json!({"id": "00000000-0000-0000-0000-000000000001", "slug": "ss26-coastal",
                       "status": "ready", "season": "SS26", "domain": "womenswear",
                       "report_type": "color", "created_at": "2025-02-01T00:00:00Z"}),
                json!({"id": "00000000-0000-0000-0000-000000000002", "slug": "aw25-heritage",
                       "status": "ready", "season": "AW25", "domain": "menswear",
                       "report_type": "print+pattern", "created_at": "2025-03-01T00:00:00Z"}),
            ],
        );
        let fetcher = Fetcher::new(Arc::new(store));
        let filters = Filters {
            season: Some("ss26".into()),
            ..Default::default()
        };
        let page = fetcher
            .fetch(&SearchPlan::TREND, &SearchContext::new("", filters), 24)
            .await;
        let slugs: Vec<&str> = page.boards().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["ss26-coastal"]);
    }

    #[tokio::test]
    async fn test_malformed_row_is_skipped_not_fatal() {
        let store = MemoryStore::new();
        store.insert(
            Collection::Boards,
            vec![
                json!({"id": "00000000-0000-0000-0000-000000000001", "slug": "good",
                       "status": "ready", "created_at": "2025-02-01T00:00:00Z"}),
                json!({"id": "00000000-0000-0000-0000-000000000002", "slug": null,
                       "status": "ready", "created_at": "2025-03-01T00:00:00Z"}),
            ],
        );
        let fetcher = Fetcher::new(Arc::new(store));
        let ctx = SearchContext::new("", Filters::default());

        let page = fetcher.fetch(&SearchPlan::TREND, &ctx, 24).await;
        let slugs: Vec<&str> = page.boards().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["good"]);
        assert!(!page.has_more);

        // has_more counts raw rows, including ones that fail to decode
        let page = fetcher.fetch(&SearchPlan::TREND, &ctx, 1).await;
        assert!(page.items.is_empty());
        assert!(page.has_more);
    }

    #[tokio::test]
    async fn test_ranked_skips_asset_with_bad_id() {
        let rows = vec![
            asset_row(1, "A", "floral", json!({})),
            json!({"id": "not-a-uuid", "title": "B", "domain": "floral", "status": "ready"}),
        ];
        let fetcher = Fetcher::new(store_with(rows));
        let ctx = SearchContext::new("floral", Filters::default());
        let page = fetcher.fetch(&SearchPlan::CURATE, &ctx, 9).await;
        let titles: Vec<_> = page.assets().map(|(a, _)| a.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["A"]);
    }

    #[tokio::test]
    async fn test_board_by_slug() {
        let store = MemoryStore::new();
        store.insert(
            Collection::Boards,
            vec![json!({"id": "00000000-0000-0000-0000-000000000001", "slug": "ss26-coastal"})],
        );
        let fetcher = Fetcher::new(Arc::new(store));
        assert!(fetcher.board_by_slug("ss26-coastal").await.is_some());
        assert!(fetcher.board_by_slug("missing").await.is_none());
    }
}
