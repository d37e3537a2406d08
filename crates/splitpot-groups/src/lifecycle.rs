//! Group lifecycle orchestrator: multi-step creation and deletion.

use std::sync::Arc;

use splitpot_events::{GroupEventBus, GroupEventType};
use splitpot_storage::{
    Group, GroupDraft, GroupId, GroupStore, MembershipRole, NewMembership, StoreError, UserId,
};

use crate::hooks::{AllowDelete, DeleteAuthorization};
use crate::{notify, GroupError};

/// Draft payload for group creation.
#[derive(Clone, Debug)]
pub struct NewGroup {
    pub name: String,
    pub created_by: UserId,
}

/// Payload for renaming an existing group.
#[derive(Clone, Debug)]
pub struct GroupUpdate {
    pub id: GroupId,
    pub name: String,
}

/// Sequences the multi-step group operations atomically.
pub struct GroupLifecycle {
    store: Arc<dyn GroupStore>,
    events: Arc<dyn GroupEventBus>,
    authorization: Arc<dyn DeleteAuthorization>,
}

impl GroupLifecycle {
    pub fn new(store: Arc<dyn GroupStore>, events: Arc<dyn GroupEventBus>) -> Self {
        Self {
            store,
            events,
            authorization: Arc::new(AllowDelete),
        }
    }

    /// Install the caller's admin-rights check for group deletion.
    #[must_use]
    pub fn with_delete_authorization(mut self, authorization: Arc<dyn DeleteAuthorization>) -> Self {
        self.authorization = authorization;
        self
    }

    /// Create a group and enroll its creator as admin.
    ///
    /// The two writes form one unit of work: if the enrollment fails, the
    /// just-created group is deleted again so no memberless group survives.
    pub async fn create_group(&self, new_group: &NewGroup) -> Result<Group, GroupError> {
        let name = new_group.name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidInput(
                "group name must not be empty".to_string(),
            ));
        }
        if new_group.created_by.is_nil() {
            return Err(GroupError::InvalidInput(
                "creator id must not be nil".to_string(),
            ));
        }

        let group = self
            .store
            .save_group(&GroupDraft {
                id: None,
                name: name.to_string(),
                created_by: new_group.created_by,
            })
            .await?;

        let enrolled = self
            .store
            .save_membership(&NewMembership {
                group_id: group.id,
                user_id: new_group.created_by,
                role: MembershipRole::Admin,
            })
            .await;

        if let Err(e) = enrolled {
            // Compensate: roll the group back rather than leave it memberless.
            if let Err(cleanup) = self.store.delete_group_cascade(&group.id).await {
                tracing::error!(
                    group_id = %group.id,
                    "failed to roll back group after enrollment failure: {cleanup}"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            group_id = %group.id,
            created_by = %new_group.created_by,
            name = %group.name,
            "created group"
        );
        notify::publish(
            self.events.as_ref(),
            &group.id,
            GroupEventType::Created,
            Some(new_group.created_by),
        )
        .await;

        Ok(group)
    }

    /// Rename a group. Memberships are untouched.
    pub async fn update_group(&self, update: &GroupUpdate) -> Result<Group, GroupError> {
        if update.id.is_nil() {
            return Err(GroupError::InvalidInput(
                "group id must not be nil".to_string(),
            ));
        }
        let name = update.name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidInput(
                "group name must not be empty".to_string(),
            ));
        }

        let existing = self
            .store
            .find_group(&update.id)
            .await?
            .ok_or(GroupError::GroupNotFound)?;

        let group = self
            .store
            .save_group(&GroupDraft {
                id: Some(existing.id),
                name: name.to_string(),
                created_by: existing.created_by,
            })
            .await
            .map_err(|e| match e {
                StoreError::NotFound => GroupError::GroupNotFound,
                other => GroupError::Persistence(other),
            })?;

        tracing::info!(group_id = %group.id, name = %group.name, "updated group");

        Ok(group)
    }

    /// Delete a group and every membership referencing it.
    ///
    /// The authorization hook runs first; the cascade itself is
    /// unconditional.
    pub async fn delete_group(
        &self,
        group_id: &GroupId,
        acting_user: &UserId,
    ) -> Result<(), GroupError> {
        if group_id.is_nil() {
            return Err(GroupError::InvalidInput(
                "group id must not be nil".to_string(),
            ));
        }

        self.authorization.authorize(group_id, acting_user).await?;

        let deleted = self.store.delete_group_cascade(group_id).await?;
        if !deleted {
            return Err(GroupError::GroupNotFound);
        }

        tracing::info!(group_id = %group_id, acting_user = %acting_user, "deleted group");
        notify::publish(self.events.as_ref(), group_id, GroupEventType::Deleted, None).await;

        Ok(())
    }
}
