//! Event bus abstraction for splitpot group change notifications.
//!
//! This crate defines the GroupEventBus trait that allows different
//! implementations for event broadcasting across server replicas:
//! - Memory (single server, tokio broadcast channels)
//! - Redis (multi-server, Redis pub/sub)
//! - Postgres (multi-server, PostgreSQL LISTEN/NOTIFY)

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use splitpot_storage::{GroupId, UserId};
use std::pin::Pin;
use thiserror::Error;

/// Type of group change event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEventType {
    Created,
    MemberAdded,
    MemberRemoved,
    Deleted,
}

/// Event representing a change to a group or its membership set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupChangeEvent {
    pub event_type: GroupEventType,
    pub group_id: GroupId,
    /// The member the event concerns; `None` for whole-group events.
    pub user_id: Option<UserId>,
    pub timestamp: i64,
}

/// Error type for event bus operations
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of group change events
pub type EventStream = Pin<Box<dyn Stream<Item = GroupChangeEvent> + Send>>;

/// Event bus trait for publishing and subscribing to group change events.
///
/// Publication happens after the storage write commits; delivery is
/// best-effort and read models must not depend on it.
#[async_trait]
pub trait GroupEventBus: Send + Sync {
    /// Publish a change event to all watchers of this group.
    async fn publish(
        &self,
        group_id: &GroupId,
        event: GroupChangeEvent,
    ) -> Result<(), EventBusError>;

    /// Subscribe to change events for a group.
    ///
    /// Returns a stream that yields events as they occur.
    /// The stream will continue until dropped or the connection is closed.
    async fn subscribe(&self, group_id: &GroupId) -> Result<EventStream, EventBusError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_type_equality() {
        assert_eq!(GroupEventType::Created, GroupEventType::Created);
        assert_eq!(GroupEventType::Deleted, GroupEventType::Deleted);
        assert_ne!(GroupEventType::MemberAdded, GroupEventType::MemberRemoved);
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = GroupChangeEvent {
            event_type: GroupEventType::MemberAdded,
            group_id: GroupId(Uuid::new_v4()),
            user_id: Some(UserId(Uuid::new_v4())),
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: GroupChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type, event.event_type);
        assert_eq!(back.group_id, event.group_id);
        assert_eq!(back.user_id, event.user_id);
        assert_eq!(back.timestamp, event.timestamp);
    }
}
