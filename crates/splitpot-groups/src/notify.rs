//! Best-effort event publication after committed writes.

use chrono::Utc;
use splitpot_events::{GroupChangeEvent, GroupEventBus, GroupEventType};
use splitpot_storage::{GroupId, UserId};

/// Publish a change event; a failed publish is logged, never surfaced.
pub(crate) async fn publish(
    events: &dyn GroupEventBus,
    group_id: &GroupId,
    event_type: GroupEventType,
    user_id: Option<UserId>,
) {
    let event = GroupChangeEvent {
        event_type,
        group_id: *group_id,
        user_id,
        timestamp: Utc::now().timestamp(),
    };
    if let Err(e) = events.publish(group_id, event).await {
        tracing::warn!(group_id = %group_id, "failed to publish group change event: {e}");
    }
}
