//! Common test helpers: an in-memory store wired into the three core
//! components, plus user/group seeding.

use std::sync::Arc;

use chrono::Utc;
use splitpot_events_memory::MemoryEventBus;
use splitpot_storage::{Group, UserId, UserProfile};
use splitpot_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{AggregationService, GroupLifecycle, MembershipManager, NewGroup};

pub struct TestCore {
    pub store: Arc<SqliteStore>,
    pub events: Arc<MemoryEventBus>,
    pub lifecycle: GroupLifecycle,
    pub members: MembershipManager,
    pub views: AggregationService,
}

/// Wire the core against in-memory SQLite and an in-process event bus.
pub async fn create_test_core() -> TestCore {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let events = Arc::new(MemoryEventBus::new());
    let lifecycle = GroupLifecycle::new(store.clone(), events.clone());
    let members = MembershipManager::new(store.clone(), events.clone());
    let views = AggregationService::new(store.clone(), store.clone());
    TestCore {
        store,
        events,
        lifecycle,
        members,
        views,
    }
}

/// Seed a resolvable profile and return its id.
pub async fn seed_user(core: &TestCore, email: &str) -> UserId {
    let user_id = UserId(Uuid::now_v7());
    core.store
        .upsert_profile(&UserProfile {
            user_id,
            email: email.to_string(),
            display_name: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    user_id
}

/// Create a group through the lifecycle orchestrator (creator enrolled).
pub async fn create_group_for(core: &TestCore, name: &str, creator: UserId) -> Group {
    core.lifecycle
        .create_group(&NewGroup {
            name: name.to_string(),
            created_by: creator,
        })
        .await
        .unwrap()
}
