//! In-memory store implementations.
//!
//! Both types honour the same contracts as the MySQL backend and are safe to
//! share between tasks.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use super::{AggregateCell, AggregateSource, StoreError, TileRedrawRequest, WorkQueueStore};
use crate::coord::BoundingBox;

type QueueKey = (i64, i64, u8);

/// Work queue held in a hash map keyed by `(x, y, zoom)`.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    entries: Mutex<HashMap<QueueKey, DateTime<Utc>>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with requests.
    pub fn with_requests(requests: impl IntoIterator<Item = TileRedrawRequest>) -> Self {
        let store = Self::new();
        {
            let mut entries = store.entries.lock();
            for request in requests {
                merge(&mut entries, request.key(), request.queued_at);
            }
        }
        store
    }

    /// Returns all queued requests ordered by `(queued_at, zoom, x, y)`.
    pub fn snapshot(&self) -> Vec<TileRedrawRequest> {
        let entries = self.entries.lock();
        let mut requests: Vec<_> = entries
            .iter()
            .map(|(&(x, y, zoom), &queued_at)| TileRedrawRequest::new(x, y, zoom, queued_at))
            .collect();
        requests.sort_by_key(|r| (r.queued_at, r.zoom, r.x, r.y));
        requests
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Oldest timestamp wins.
fn merge(entries: &mut HashMap<QueueKey, DateTime<Utc>>, key: QueueKey, queued_at: DateTime<Utc>) {
    entries
        .entry(key)
        .and_modify(|existing| {
            if queued_at < *existing {
                *existing = queued_at;
            }
        })
        .or_insert(queued_at);
}

impl WorkQueueStore for MemoryQueueStore {
    async fn claim_next(
        &self,
        min_age: Duration,
        zoom_min: u8,
        zoom_max: u8,
    ) -> Result<Option<TileRedrawRequest>, StoreError> {
        let min_age = chrono::Duration::from_std(min_age)
            .map_err(|e| StoreError::Query(format!("minimum age out of range: {}", e)))?;
        let cutoff = Utc::now()
            .checked_sub_signed(min_age)
            .ok_or_else(|| StoreError::Query("minimum age out of range".to_string()))?;

        let entries = self.entries.lock();
        let oldest = entries
            .iter()
            .filter(|&(&(_, _, zoom), &queued_at)| {
                queued_at < cutoff && (zoom_min..=zoom_max).contains(&zoom)
            })
            .min_by_key(|&(&(x, y, zoom), &queued_at)| (queued_at, zoom, x, y))
            .map(|(&(x, y, zoom), &queued_at)| TileRedrawRequest::new(x, y, zoom, queued_at));

        Ok(oldest)
    }

    async fn delete_overlapping(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        radius: u32,
    ) -> Result<u64, StoreError> {
        let radius = radius as i64;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|&(ex, ey, ez), _| {
            !(ez == zoom && (ex - x).abs() <= radius && (ey - y).abs() <= radius)
        });
        Ok((before - entries.len()) as u64)
    }

    async fn enqueue(
        &self,
        x: i64,
        y: i64,
        zoom: u8,
        queued_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        merge(&mut self.entries.lock(), (x, y, zoom), queued_at);
        Ok(())
    }

    async fn pending(&self) -> Result<u64, StoreError> {
        Ok(self.entries.lock().len() as u64)
    }
}

/// Aggregate cells held in a vector, filtered on every query.
#[derive(Debug)]
pub struct MemoryAggregateSource {
    zoom: u8,
    cells: RwLock<Vec<AggregateCell>>,
}

impl MemoryAggregateSource {
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom,
            cells: RwLock::new(Vec::new()),
        }
    }

    pub fn with_cells(zoom: u8, cells: Vec<AggregateCell>) -> Self {
        Self {
            zoom,
            cells: RwLock::new(cells),
        }
    }

    pub fn insert(&self, cell: AggregateCell) {
        self.cells.write().push(cell);
    }
}

impl AggregateSource for MemoryAggregateSource {
    fn source_zoom(&self) -> u8 {
        self.zoom
    }

    async fn cells_in(&self, bbox: &BoundingBox) -> Result<Vec<AggregateCell>, StoreError> {
        if bbox.zoom != self.zoom {
            return Err(StoreError::Query(format!(
                "aggregates are stored at zoom {}, bounding box is at zoom {}",
                self.zoom, bbox.zoom
            )));
        }

        Ok(self
            .cells
            .read()
            .iter()
            .filter(|cell| bbox.contains(cell.x, cell.y))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::padded_bounding_box_at_zoom;

    fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::minutes(minutes)
    }

    fn cell(x: u32, y: u32) -> AggregateCell {
        AggregateCell {
            x,
            y,
            gateway_id: "eui-0000000000000001".to_string(),
            samples: 1,
            rssi_max: -100.0,
        }
    }

    #[tokio::test]
    async fn test_claim_returns_oldest_then_delete_purges_neighbour() {
        let store = MemoryQueueStore::with_requests([
            TileRedrawRequest::new(10, 10, 12, minutes_ago(5)),
            TileRedrawRequest::new(11, 10, 12, minutes_ago(3)),
        ]);

        let claimed = store
            .claim_next(Duration::from_secs(60), 1, 19)
            .await
            .unwrap()
            .expect("a request should be claimable");
        assert_eq!(claimed.key(), (10, 10, 12));

        // Claiming does not remove anything
        assert_eq!(store.len(), 2);

        let removed = store.delete_overlapping(10, 10, 12, 1).await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_claim_on_empty_queue() {
        let store = MemoryQueueStore::new();
        let claimed = store.claim_next(Duration::from_secs(1), 0, 19).await;
        assert!(claimed.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_skips_requests_younger_than_min_age() {
        let store = MemoryQueueStore::with_requests([TileRedrawRequest::new(
            1,
            1,
            5,
            Utc::now(),
        )]);

        let claimed = store.claim_next(Duration::from_secs(60), 0, 19).await;
        assert!(claimed.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_respects_zoom_range() {
        let store = MemoryQueueStore::with_requests([
            TileRedrawRequest::new(1, 1, 20, minutes_ago(10)),
            TileRedrawRequest::new(1, 1, 8, minutes_ago(2)),
        ]);

        let claimed = store
            .claim_next(Duration::from_secs(1), 1, 19)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.zoom, 8);
    }

    #[tokio::test]
    async fn test_delete_overlapping_clears_window_only() {
        let mut requests = Vec::new();
        for x in 8..=12 {
            for y in 8..=12 {
                requests.push(TileRedrawRequest::new(x, y, 12, minutes_ago(1)));
            }
        }
        // Same index at a different zoom must survive
        requests.push(TileRedrawRequest::new(10, 10, 13, minutes_ago(1)));
        let store = MemoryQueueStore::with_requests(requests);

        let removed = store.delete_overlapping(10, 10, 12, 1).await.unwrap();
        assert_eq!(removed, 9);

        for request in store.snapshot() {
            let inside = request.zoom == 12
                && (request.x - 10).abs() <= 1
                && (request.y - 10).abs() <= 1;
            assert!(!inside, "{:?} should have been purged", request);
        }
        assert_eq!(store.len(), 25 - 9 + 1);
    }

    #[tokio::test]
    async fn test_delete_with_zero_radius_removes_exact_entry() {
        let store = MemoryQueueStore::with_requests([
            TileRedrawRequest::new(-4, 2, 3, minutes_ago(1)),
            TileRedrawRequest::new(-3, 2, 3, minutes_ago(1)),
        ]);

        assert_eq!(store.delete_overlapping(-4, 2, 3, 0).await.unwrap(), 1);
        assert_eq!(store.snapshot()[0].key(), (-3, 2, 3));
    }

    #[tokio::test]
    async fn test_enqueue_keeps_oldest_timestamp() {
        let store = MemoryQueueStore::new();
        let older = minutes_ago(10);
        let newer = minutes_ago(1);

        store.enqueue(5, 5, 10, newer).await.unwrap();
        store.enqueue(5, 5, 10, older).await.unwrap();
        store.enqueue(5, 5, 10, newer).await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].queued_at, older);
        assert_eq!(store.pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_aggregate_source_filters_by_box() {
        let source = MemoryAggregateSource::with_cells(19, vec![cell(1024, 1024), cell(2000, 2000)]);
        let bbox = padded_bounding_box_at_zoom(10, 10, 12, 2, 19).unwrap();

        let cells = source.cells_in(&bbox).await.unwrap();
        assert_eq!(cells, vec![cell(1024, 1024)]);
    }

    #[tokio::test]
    async fn test_aggregate_source_rejects_wrong_zoom() {
        let source = MemoryAggregateSource::new(19);
        let bbox = padded_bounding_box_at_zoom(10, 10, 12, 2, 18).unwrap();

        assert!(matches!(
            source.cells_in(&bbox).await,
            Err(StoreError::Query(_))
        ));
    }
}
