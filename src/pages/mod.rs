//! Per-bucket pages.
//!
//! # Data Flow
//! ```text
//! startup:
//!     paths.rs (bucket names + fallback) → render.rs → PageStore
//!
//! GET /<bucket> (direct, or rewritten from /):
//!     flag cookie off + known bucket → PageStore
//!     otherwise                      → render.rs on demand
//! ```
//!
//! # Design Decisions
//! - Only enumerated buckets are stored, so arbitrary paths cannot grow memory
//! - Unknown buckets still get a page (blocking fallback)

pub mod paths;
pub mod render;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Html,
    routing::get,
    Router,
};
use dashmap::DashMap;

use crate::config::ExperimentConfig;
use crate::identity::cookie_value;
use crate::observability::metrics;

pub use paths::{static_paths, try_static_paths};
pub use render::{render_bucket_page, NOT_SET_UP_MESSAGE};

/// Pages rendered ahead of time, keyed by bucket.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: DashMap<String, Arc<str>>,
}

impl PageStore {
    /// Render one page per bucket (gate-off variant).
    pub fn prerender(buckets: &[String], experiment: &ExperimentConfig) -> Self {
        let pages = DashMap::with_capacity(buckets.len());
        for bucket in buckets {
            pages.insert(bucket.clone(), Arc::from(render_bucket_page(bucket, false, experiment)));
        }
        tracing::info!(pages = pages.len(), "Pre-rendered bucket pages");
        Self { pages }
    }

    pub fn get(&self, bucket: &str) -> Option<Arc<str>> {
        self.pages.get(bucket).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Bucket names that have a stored page.
    pub fn buckets(&self) -> Vec<String> {
        self.pages.iter().map(|r| r.key().clone()).collect()
    }
}

#[derive(Clone)]
struct PageState {
    store: Arc<PageStore>,
    experiment: Arc<ExperimentConfig>,
}

/// Router serving `/<bucket>`.
pub fn pages_router(store: Arc<PageStore>, experiment: ExperimentConfig) -> Router {
    Router::new()
        .route("/{bucket}", get(bucket_page))
        .with_state(PageState {
            store,
            experiment: Arc::new(experiment),
        })
}

async fn bucket_page(
    State(state): State<PageState>,
    Path(bucket): Path<String>,
    headers: HeaderMap,
) -> Html<String> {
    // The client keeps the flag in a cookie named after the gate.
    let flag_on = cookie_value(&headers, &state.experiment.gate).as_deref() == Some("true");

    if !flag_on {
        if let Some(page) = state.store.get(&bucket) {
            metrics::record_page("prerendered");
            return Html(page.to_string());
        }
    }

    metrics::record_page("rendered");
    Html(render_bucket_page(&bucket, flag_on, &state.experiment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_page(router: Router, uri: &str, cookie: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header("cookie", c);
        }
        let response = router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_prerender_stores_each_bucket() {
        let buckets = vec!["groupA".to_string(), "default".to_string()];
        let store = PageStore::prerender(&buckets, &ExperimentConfig::default());
        assert_eq!(store.len(), 2);
        assert!(store.get("default").unwrap().contains(NOT_SET_UP_MESSAGE));
        assert!(store.get("groupC").is_none());
    }

    #[tokio::test]
    async fn test_serves_known_and_unknown_buckets() {
        let experiment = ExperimentConfig::default();
        let store = Arc::new(PageStore::prerender(&["groupA".to_string()], &experiment));
        let router = pages_router(store.clone(), experiment);

        let (status, body) = get_page(router.clone(), "/groupA", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("bucket: groupA"));

        let (status, body) = get_page(router, "/groupZ", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("bucket: groupZ"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_flag_cookie_turns_flag_on() {
        let experiment = ExperimentConfig::default();
        let store = Arc::new(PageStore::prerender(&["groupA".to_string()], &experiment));
        let router = pages_router(store, experiment);

        let (_, body) = get_page(router, "/groupA", Some("edge_redirect=true")).await;
        assert!(body.contains("feature flag `edge_redirect`: on"));
    }
}
