//! Upstream product catalog client.
//!
//! Products are not stored locally. The storefront lists them from a
//! read-only JSON catalog (`GET {api_url}/products?limit=N`) and caches each
//! listing for 5 minutes.

mod types;

pub use types::CatalogProduct;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CatalogConfig;
use types::ProductPage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the upstream catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure or timeout.
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("catalog returned HTTP {0}")]
    Status(u16),

    /// The body was not a product listing.
    #[error("failed to parse catalog response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the upstream product catalog.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    api_url: String,
    page_size: u32,
    cache: Cache<u32, Arc<Vec<CatalogProduct>>>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            inner: Arc::new(CatalogClientInner {
                client,
                api_url: config.api_url.trim_end_matches('/').to_string(),
                page_size: config.page_size,
                cache,
            }),
        }
    }

    /// Number of products on the storefront listing.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.inner.page_size
    }

    /// The first page of products, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the upstream request fails.
    pub async fn products(&self) -> Result<Arc<Vec<CatalogProduct>>, CatalogError> {
        self.list(self.inner.page_size).await
    }

    /// Up to `limit` products, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the upstream request fails. Failures are not
    /// cached.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: u32) -> Result<Arc<Vec<CatalogProduct>>, CatalogError> {
        if let Some(products) = self.inner.cache.get(&limit).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = Arc::new(self.fetch(limit).await?);
        self.inner.cache.insert(limit, Arc::clone(&products)).await;
        Ok(products)
    }

    async fn fetch(&self, limit: u32) -> Result<Vec<CatalogProduct>, CatalogError> {
        let url = format!("{}/products", self.inner.api_url);

        let response = self
            .inner
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(CatalogError::Status(status.as_u16()));
        }

        let page: ProductPage = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse catalog response");
            e
        })?;

        debug!(count = page.products.len(), "Fetched product listing");
        Ok(page.products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Limit {
        limit: u32,
    }

    async fn listing(
        State(hits): State<Arc<AtomicUsize>>,
        Query(Limit { limit }): Query<Limit>,
    ) -> String {
        hits.fetch_add(1, Ordering::SeqCst);
        let products: Vec<String> = (1..=limit)
            .map(|id| format!(r#"{{"id":{id},"title":"Item {id}","price":1.50}}"#))
            .collect();
        format!(r#"{{"products":[{}]}}"#, products.join(","))
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(api_url: String) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            api_url,
            page_size: 3,
        })
    }

    #[tokio::test]
    async fn test_listing_is_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/products", get(listing))
            .with_state(Arc::clone(&hits));
        let catalog = client(serve(router).await);

        let first = catalog.products().await.unwrap();
        let second = catalog.products().await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let router = Router::new().route(
            "/products",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let catalog = client(serve(router).await);

        let err = catalog.products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Status(503)));
    }

    #[tokio::test]
    async fn test_unparsable_body() {
        let router = Router::new().route("/products", get(|| async { "<html>oops</html>" }));
        let catalog = client(serve(router).await);

        let err = catalog.products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let catalog = client("http://127.0.0.1:9".to_string());
        let err = catalog.products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Http(_)));
    }
}
