//! Membership manager: enrollment and removal invariants.

use std::sync::Arc;

use splitpot_events::{GroupEventBus, GroupEventType};
use splitpot_storage::{
    GroupId, GroupStore, Membership, MembershipRole, NewMembership, StoreError, UserId,
};

use crate::hooks::{AllowRemoval, RemovalPrecondition};
use crate::{notify, GroupError};

/// Enforces the enrollment/removal invariants over the group store.
///
/// Does not check capacity or caller permission; those belong to outer
/// layers.
pub struct MembershipManager {
    store: Arc<dyn GroupStore>,
    events: Arc<dyn GroupEventBus>,
    precondition: Arc<dyn RemovalPrecondition>,
}

impl MembershipManager {
    pub fn new(store: Arc<dyn GroupStore>, events: Arc<dyn GroupEventBus>) -> Self {
        Self {
            store,
            events,
            precondition: Arc::new(AllowRemoval),
        }
    }

    /// Install the ledger collaborator's pre-removal check.
    #[must_use]
    pub fn with_removal_precondition(mut self, precondition: Arc<dyn RemovalPrecondition>) -> Self {
        self.precondition = precondition;
        self
    }

    /// Enroll a user in a group.
    ///
    /// Fails with `InvalidInput` for nil identifiers, `GroupNotFound` when
    /// the group does not exist, and `AlreadyMember` when the pair already
    /// exists. A single insert, nothing else.
    pub async fn add_member(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
        role: MembershipRole,
    ) -> Result<Membership, GroupError> {
        if group_id.is_nil() {
            return Err(GroupError::InvalidInput(
                "group id must not be nil".to_string(),
            ));
        }
        if user_id.is_nil() {
            return Err(GroupError::InvalidInput(
                "user id must not be nil".to_string(),
            ));
        }

        if self.store.find_group(group_id).await?.is_none() {
            return Err(GroupError::GroupNotFound);
        }

        let membership = self
            .store
            .save_membership(&NewMembership {
                group_id: *group_id,
                user_id: *user_id,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => GroupError::AlreadyMember,
                StoreError::NotFound => GroupError::GroupNotFound,
                other => GroupError::Persistence(other),
            })?;

        tracing::info!(
            group_id = %group_id,
            user_id = %user_id,
            role = role.as_str(),
            "added group member"
        );
        notify::publish(
            self.events.as_ref(),
            group_id,
            GroupEventType::MemberAdded,
            Some(*user_id),
        )
        .await;

        Ok(membership)
    }

    /// Remove a user from a group.
    ///
    /// Returns `Ok(false)` when the pair did not exist (idempotent no-op).
    /// When the removed member was the last one, the group is deleted in the
    /// same operation: a memberless group is not a valid steady state.
    pub async fn remove_member(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<bool, GroupError> {
        if self.store.find_group(group_id).await?.is_none() {
            return Err(GroupError::GroupNotFound);
        }

        self.precondition.check(group_id, user_id).await?;

        let removal = self.store.delete_membership(group_id, user_id).await?;
        if !removal.removed {
            return Ok(false);
        }

        tracing::info!(group_id = %group_id, user_id = %user_id, "removed group member");
        notify::publish(
            self.events.as_ref(),
            group_id,
            GroupEventType::MemberRemoved,
            Some(*user_id),
        )
        .await;

        if removal.remaining == 0 {
            // The store re-checks emptiness under the group row lock, so a
            // concurrent enrollment keeps the group alive.
            let deleted = self.store.delete_group_if_orphaned(group_id).await?;
            if deleted {
                tracing::info!(group_id = %group_id, "deleted group after last member left");
                notify::publish(
                    self.events.as_ref(),
                    group_id,
                    GroupEventType::Deleted,
                    None,
                )
                .await;
            }
        }

        Ok(true)
    }
}
