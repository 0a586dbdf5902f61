use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::models::{GeotaggedRecord, ProductMessage};

/// Short-lived in-memory cache of fetched feeds
///
/// Zone queries from many reference points share one fetched batch, which is
/// why the zone feed is cached whole and filtered per request.
pub struct FeedCache {
    messages: Cache<String, Arc<Vec<GeotaggedRecord>>>,
    products: Cache<String, Arc<Vec<ProductMessage>>>,
}

impl FeedCache {
    pub fn new(ttl_secs: u64, max_products: u64) -> Self {
        let messages = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        let products = Cache::builder()
            .max_capacity(max_products)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { messages, products }
    }

    /// Cached zone feed, fetched with `fetch` on a miss
    pub async fn messages<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<GeotaggedRecord>>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<GeotaggedRecord>, E>>,
        E: Send + Sync + 'static,
    {
        self.messages
            .try_get_with(CacheKey::messages(), async move {
                tracing::trace!("Cache miss: {}", CacheKey::messages());
                fetch().await.map(Arc::new)
            })
            .await
    }

    /// Cached product chat for one barcode
    pub async fn product_messages<F, Fut, E>(
        &self,
        barcode: &str,
        fetch: F,
    ) -> Result<Arc<Vec<ProductMessage>>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ProductMessage>, E>>,
        E: Send + Sync + 'static,
    {
        let key = CacheKey::product(barcode);
        self.products
            .try_get_with(key, async move { fetch().await.map(Arc::new) })
            .await
    }

    pub async fn invalidate_messages(&self) {
        self.messages.invalidate(&CacheKey::messages()).await;
    }

    pub async fn invalidate_product(&self, barcode: &str) {
        self.products.invalidate(&CacheKey::product(barcode)).await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            feeds: self.messages.entry_count(),
            product_feeds: self.products.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub feeds: u64,
    pub product_feeds: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for the whole zone feed
    pub fn messages() -> String {
        "messages".to_string()
    }

    /// Key for one barcode's chat
    pub fn product(barcode: &str) -> String {
        format!("product:{}", barcode)
    }
}
