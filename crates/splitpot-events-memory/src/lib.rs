//! In-memory event bus implementation using tokio broadcast channels.
//!
//! This implementation is suitable for:
//! - Single server deployments
//! - Development and testing
//!
//! For multi-replica deployments, use a Redis or Postgres event bus instead.

use async_trait::async_trait;
use dashmap::DashMap;
use splitpot_events::{EventBusError, EventStream, GroupChangeEvent, GroupEventBus};
use splitpot_storage::GroupId;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const CHANNEL_CAPACITY: usize = 100;

/// In-memory event bus using tokio broadcast channels.
///
/// Events are only broadcast within a single process.
/// If you have multiple server replicas, they will NOT receive each other's
/// events.
pub struct MemoryEventBus {
    channels: Arc<DashMap<GroupId, broadcast::Sender<GroupChangeEvent>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
        }
    }

    /// Get or create a broadcast channel for a group
    fn get_or_create_channel(&self, group_id: &GroupId) -> broadcast::Sender<GroupChangeEvent> {
        self.channels
            .entry(*group_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupEventBus for MemoryEventBus {
    async fn publish(
        &self,
        group_id: &GroupId,
        event: GroupChangeEvent,
    ) -> Result<(), EventBusError> {
        let tx = self.get_or_create_channel(group_id);

        // Ignore error if no receivers (this is fine)
        let _ = tx.send(event);

        Ok(())
    }

    async fn subscribe(&self, group_id: &GroupId) -> Result<EventStream, EventBusError> {
        let tx = self.get_or_create_channel(group_id);
        let rx = tx.subscribe();

        // Filter out lagged errors (happens when a receiver can't keep up).
        // Client fell behind, they should do a full resync
        let stream = BroadcastStream::new(rx).filter_map(|result| result.ok());

        Ok(Box::pin(stream))
    }
}
