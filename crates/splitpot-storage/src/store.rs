//! The storage and directory traits that backends implement.

use crate::types::*;
use crate::StoreError;

/// The group storage trait the membership core depends on.
///
/// The store enforces single-row constraints only (uniqueness, row
/// existence); cross-entity invariants belong to the membership and
/// lifecycle layers above it.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait GroupStore: Send + Sync {
    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Insert (`draft.id == None`) or update (`draft.id == Some`) a group.
    ///
    /// Updating a missing row fails with `StoreError::NotFound`.
    async fn save_group(&self, draft: &GroupDraft) -> Result<Group, StoreError>;

    /// Get group by ID, `None` when absent.
    async fn find_group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError>;

    /// Delete the group and every membership referencing it.
    ///
    /// Returns `true` when a group row was removed; succeeds (`false`) for an
    /// already-absent group.
    async fn delete_group_cascade(&self, group_id: &GroupId) -> Result<bool, StoreError>;

    /// Delete the group only if it has no memberships left.
    ///
    /// The emptiness re-check and the delete run atomically under the group
    /// row lock, so a concurrent enrollment keeps the group alive. Returns
    /// `false` when the group is absent or non-empty.
    async fn delete_group_if_orphaned(&self, group_id: &GroupId) -> Result<bool, StoreError>;

    // ───────────────────────────────────── Memberships ────────────────────────────────────

    /// Persist a new membership.
    ///
    /// Fails with `AlreadyExists` on a duplicate `(group, user)` pair and
    /// with `NotFound` when the group row is absent.
    async fn save_membership(&self, params: &NewMembership) -> Result<Membership, StoreError>;

    /// Delete one membership and report the remaining count.
    ///
    /// Delete and count run in one transaction holding the group row lock.
    async fn delete_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<MembershipRemoval, StoreError>;

    /// All memberships of a group, in join order.
    async fn find_memberships_by_group(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Membership>, StoreError>;

    /// All group ids a user belongs to, ordered by join time.
    async fn find_group_ids_by_user(&self, user_id: &UserId) -> Result<Vec<GroupId>, StoreError>;
}

/// Read-only access to user profiles.
///
/// The identity subsystem owns profile records; the membership core resolves
/// them through this trait when building member views.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get one profile, `None` when the user is unknown.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Batch lookup; identifiers that do not resolve are omitted.
    async fn find_users(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, StoreError>;
}
