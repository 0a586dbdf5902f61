use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::core::Zone;
use crate::models::{GeotaggedRecord, ProductMessage, ProximityResult};

/// In-process publish/subscribe for newly created records
///
/// The zone topic carries every geotagged message once; each subscriber
/// filters by its own zone. Product topics are keyed by barcode and created
/// on first subscription.
pub struct Hub {
    zone: broadcast::Sender<GeotaggedRecord>,
    products: RwLock<HashMap<String, broadcast::Sender<ProductMessage>>>,
    capacity: usize,
}

impl Hub {
    /// A capacity of zero is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (zone, _) = broadcast::channel(capacity);
        Self {
            zone,
            products: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Publish a new zone message, returning how many subscribers saw it
    pub fn publish_record(&self, record: GeotaggedRecord) -> usize {
        // Sending fails only when nobody is listening
        self.zone.send(record).unwrap_or(0)
    }

    pub fn subscribe_zone(&self, zone: Zone) -> ZoneSubscription {
        let id = Uuid::new_v4();
        tracing::debug!(
            "Zone subscription {} at ({}, {}) within {}m",
            id,
            zone.center().latitude(),
            zone.center().longitude(),
            zone.radius_m()
        );

        ZoneSubscription {
            id,
            zone,
            receiver: self.zone.subscribe(),
        }
    }

    /// Publish a product message to its barcode topic
    pub fn publish_product(&self, message: ProductMessage) -> usize {
        let mut topics = self
            .products
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let barcode = message.barcode.clone();
        let Some(sender) = topics.get(&barcode) else {
            return 0;
        };

        match sender.send(message) {
            Ok(delivered) => delivered,
            Err(_) => {
                topics.remove(&barcode);
                tracing::debug!("Dropped idle product topic {}", barcode);
                0
            }
        }
    }

    pub fn subscribe_product(&self, barcode: &str) -> ProductSubscription {
        let mut topics = self
            .products
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        topics.retain(|_, sender| sender.receiver_count() > 0);

        let receiver = topics
            .entry(barcode.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        ProductSubscription {
            barcode: barcode.to_string(),
            receiver,
        }
    }

    pub fn zone_subscribers(&self) -> usize {
        self.zone.receiver_count()
    }

    pub fn product_topics(&self) -> usize {
        self.products
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Live feed of zone messages that land inside one zone
pub struct ZoneSubscription {
    id: Uuid,
    zone: Zone,
    receiver: broadcast::Receiver<GeotaggedRecord>,
}

impl ZoneSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next nearby message; `None` once the hub is gone
    pub async fn next(&mut self) -> Option<ProximityResult<GeotaggedRecord>> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => {
                    if let Some(nearby) = self.zone.admit(record) {
                        tracing::trace!(
                            "Subscription {} received signal at {}m",
                            self.id,
                            nearby.distance
                        );
                        return Some(nearby);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Subscription {} lagged, skipped {} messages", self.id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Live feed of one barcode's chat
pub struct ProductSubscription {
    barcode: String,
    receiver: broadcast::Receiver<ProductMessage>,
}

impl ProductSubscription {
    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub async fn next(&mut self) -> Option<ProductMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Product topic {} lagged, skipped {}", self.barcode, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::EARTH_RADIUS_M;
    use crate::models::GeoPoint;

    fn record_at(id: i64, lat: f64, lon: f64) -> GeotaggedRecord {
        GeotaggedRecord {
            id: Some(id),
            user_id: "Electric Eagle".to_string(),
            content: "signal".to_string(),
            location: GeoPoint::new(lat, lon).unwrap(),
            created_at: None,
        }
    }

    fn product_message(barcode: &str, content: &str) -> ProductMessage {
        ProductMessage {
            id: None,
            user_id: "Rapid Cobra".to_string(),
            barcode: barcode.to_string(),
            content: content.to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_zone_subscription_filters_by_radius() {
        let hub = Hub::new(16);
        let center = GeoPoint::new(27.7172, 85.3240).unwrap();
        let mut subscription = hub.subscribe_zone(Zone::new(center, 1000));

        let step = (500.0 / EARTH_RADIUS_M).to_degrees();
        hub.publish_record(record_at(1, 28.2096, 83.9856));
        hub.publish_record(record_at(2, 27.7172 + step, 85.3240));

        let nearby = subscription.next().await.unwrap();
        assert_eq!(nearby.record.id, Some(2));
        assert_eq!(nearby.distance, 500);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_hub_dropped() {
        let hub = Hub::new(4);
        let mut subscription =
            hub.subscribe_zone(Zone::new(GeoPoint::new(0.0, 0.0).unwrap(), 10));
        drop(hub);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_ahead() {
        let hub = Hub::new(2);
        let center = GeoPoint::new(27.7172, 85.3240).unwrap();
        let mut subscription = hub.subscribe_zone(Zone::new(center, 1000));

        for id in 0..5 {
            hub.publish_record(record_at(id, 27.7172, 85.3240));
        }

        let first = subscription.next().await.unwrap();
        assert_eq!(first.record.id, Some(3));
    }

    #[tokio::test]
    async fn test_product_topics_are_isolated() {
        let hub = Hub::new(8);
        let mut noodles = hub.subscribe_product("8901234567890");
        let mut biscuits = hub.subscribe_product("8909876543210");

        assert_eq!(hub.publish_product(product_message("8901234567890", "too salty")), 1);

        let received = noodles.next().await.unwrap();
        assert_eq!(received.content, "too salty");
        assert_eq!(biscuits.barcode(), "8909876543210");
        assert_eq!(hub.product_topics(), 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_usable() {
        let hub = Hub::new(0);
        let center = GeoPoint::new(27.7172, 85.3240).unwrap();
        let mut zone = hub.subscribe_zone(Zone::new(center, 1000));
        let mut product = hub.subscribe_product("8901234567890");

        assert_eq!(hub.publish_record(record_at(7, 27.7172, 85.3240)), 1);
        assert_eq!(hub.publish_product(product_message("8901234567890", "restocked")), 1);

        assert_eq!(zone.next().await.unwrap().record.id, Some(7));
        assert_eq!(product.next().await.unwrap().content, "restocked");
    }

    #[test]
    fn test_idle_product_topics_are_pruned() {
        let hub = Hub::new(8);
        let subscription = hub.subscribe_product("111");
        drop(subscription);

        assert_eq!(hub.publish_product(product_message("111", "anyone?")), 0);
        assert_eq!(hub.product_topics(), 0);
        assert_eq!(hub.publish_product(product_message("222", "nobody")), 0);
    }
}
