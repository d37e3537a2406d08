//! Lifecycle orchestrator tests: creation atomicity, update, delete.

use std::sync::Arc;

use chrono::Utc;
use splitpot_events_memory::MemoryEventBus;
use splitpot_storage::{
    Group, GroupId, GroupStore, MockGroupStore, StoreError, UserId,
};
use uuid::Uuid;

use super::common::*;
use crate::hooks::DeleteAuthorization;
use crate::{GroupError, GroupLifecycle, GroupUpdate, NewGroup};

#[tokio::test]
async fn create_group_enrolls_creator() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;

    let group = create_group_for(&core, "Trip", creator).await;

    let members = core.views.member_list(&group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, creator);
    assert!(members[0].role.is_admin());
}

#[tokio::test]
async fn create_group_rejects_blank_name() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;

    let result = core
        .lifecycle
        .create_group(&NewGroup {
            name: "   ".to_string(),
            created_by: creator,
        })
        .await;

    assert!(matches!(result, Err(GroupError::InvalidInput(_))));
}

#[tokio::test]
async fn create_group_rejects_nil_creator() {
    let core = create_test_core().await;

    let result = core
        .lifecycle
        .create_group(&NewGroup {
            name: "Trip".to_string(),
            created_by: UserId(Uuid::nil()),
        })
        .await;

    assert!(matches!(result, Err(GroupError::InvalidInput(_))));
}

#[tokio::test]
async fn create_group_trims_name() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;

    let group = create_group_for(&core, "  Trip  ", creator).await;
    assert_eq!(group.name, "Trip");
}

#[tokio::test]
async fn failed_enrollment_rolls_the_group_back() {
    let mut store = MockGroupStore::new();
    store.expect_save_group().returning(|draft| {
        Ok(Group {
            id: GroupId(Uuid::now_v7()),
            name: draft.name.clone(),
            created_by: draft.created_by,
            created_at: Utc::now(),
        })
    });
    store
        .expect_save_membership()
        .returning(|_| Err(StoreError::Backend("insert failed".to_string())));
    // The compensating delete must run exactly once.
    store
        .expect_delete_group_cascade()
        .times(1)
        .returning(|_| Ok(true));

    let lifecycle = GroupLifecycle::new(Arc::new(store), Arc::new(MemoryEventBus::new()));
    let result = lifecycle
        .create_group(&NewGroup {
            name: "Trip".to_string(),
            created_by: UserId(Uuid::now_v7()),
        })
        .await;

    assert!(matches!(result, Err(GroupError::Persistence(_))));
}

#[tokio::test]
async fn update_group_renames_without_touching_members() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;
    let group = create_group_for(&core, "Trip", creator).await;

    let updated = core
        .lifecycle
        .update_group(&GroupUpdate {
            id: group.id,
            name: "Road Trip".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(updated.id, group.id);
    assert_eq!(updated.name, "Road Trip");
    assert_eq!(updated.created_by, creator);

    let members = core.views.member_list(&group.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, creator);
}

#[tokio::test]
async fn update_unknown_group_fails() {
    let core = create_test_core().await;

    let result = core
        .lifecycle
        .update_group(&GroupUpdate {
            id: GroupId(Uuid::now_v7()),
            name: "Ghost".to_string(),
        })
        .await;

    assert!(matches!(result, Err(GroupError::GroupNotFound)));
}

#[tokio::test]
async fn update_nil_group_id_is_invalid() {
    let core = create_test_core().await;

    let result = core
        .lifecycle
        .update_group(&GroupUpdate {
            id: GroupId(Uuid::nil()),
            name: "Trip".to_string(),
        })
        .await;

    assert!(matches!(result, Err(GroupError::InvalidInput(_))));
}

#[tokio::test]
async fn delete_group_purges_memberships() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;
    let other = seed_user(&core, "u2@example.com").await;
    let group = create_group_for(&core, "Trip", creator).await;
    core.members
        .add_member(&group.id, &other, splitpot_storage::MembershipRole::Member)
        .await
        .unwrap();

    core.lifecycle.delete_group(&group.id, &creator).await.unwrap();

    assert!(core.store.find_group(&group.id).await.unwrap().is_none());
    assert!(core
        .store
        .find_memberships_by_group(&group.id)
        .await
        .unwrap()
        .is_empty());
    assert!(core.views.groups_for_user(&other).await.unwrap().is_empty());
    assert!(core.views.groups_for_user(&creator).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_unknown_group_fails() {
    let core = create_test_core().await;
    let actor = seed_user(&core, "u1@example.com").await;

    let result = core
        .lifecycle
        .delete_group(&GroupId(Uuid::now_v7()), &actor)
        .await;

    assert!(matches!(result, Err(GroupError::GroupNotFound)));
}

struct DenyAll;

#[async_trait::async_trait]
impl DeleteAuthorization for DenyAll {
    async fn authorize(
        &self,
        _group_id: &GroupId,
        _acting_user: &UserId,
    ) -> Result<(), GroupError> {
        Err(GroupError::NotAuthorized)
    }
}

#[tokio::test]
async fn delete_authorization_hook_can_veto() {
    let core = create_test_core().await;
    let creator = seed_user(&core, "u1@example.com").await;
    let group = create_group_for(&core, "Trip", creator).await;

    let guarded = GroupLifecycle::new(core.store.clone(), core.events.clone())
        .with_delete_authorization(Arc::new(DenyAll));

    let result = guarded.delete_group(&group.id, &creator).await;
    assert!(matches!(result, Err(GroupError::NotAuthorized)));

    // The group survived the vetoed delete.
    assert!(core.store.find_group(&group.id).await.unwrap().is_some());
}
