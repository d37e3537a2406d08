//! Aggregation service: derived read views over the membership graph.

use std::collections::HashMap;
use std::sync::Arc;

use splitpot_storage::{GroupId, GroupStore, Membership, UserDirectory, UserId, UserProfile};

use crate::{GroupData, GroupError, GroupSummary, MemberSummary};

/// Builds read-only projections from the group store and the user directory.
pub struct AggregationService {
    store: Arc<dyn GroupStore>,
    directory: Arc<dyn UserDirectory>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn GroupStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// The group's members in join order, resolved through the directory.
    ///
    /// A group with no memberships is indistinguishable from a deleted one
    /// and reported as `GroupNotFound`. A membership whose profile no longer
    /// resolves is omitted; that can only happen transiently.
    pub async fn member_list(&self, group_id: &GroupId) -> Result<Vec<MemberSummary>, GroupError> {
        if self.store.find_group(group_id).await?.is_none() {
            return Err(GroupError::GroupNotFound);
        }

        let memberships = self.store.find_memberships_by_group(group_id).await?;
        if memberships.is_empty() {
            return Err(GroupError::GroupNotFound);
        }

        self.resolve_members(memberships).await
    }

    /// Every group the user belongs to, as lightweight summaries.
    ///
    /// An empty list is a normal answer, not an error. Identifiers that no
    /// longer resolve to a live group are skipped.
    pub async fn groups_for_user(&self, user_id: &UserId) -> Result<Vec<GroupSummary>, GroupError> {
        let group_ids = self.store.find_group_ids_by_user(user_id).await?;

        let mut out = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            if let Some(group) = self.store.find_group(&group_id).await? {
                out.push(GroupSummary {
                    id: group.id,
                    name: group.name,
                });
            }
        }
        Ok(out)
    }

    /// Batch id→name lookup; dead identifiers are omitted, partial results
    /// are valid.
    pub async fn group_name_map(
        &self,
        group_ids: &[GroupId],
    ) -> Result<HashMap<GroupId, String>, GroupError> {
        let mut map = HashMap::new();
        for group_id in group_ids {
            if let Some(group) = self.store.find_group(group_id).await? {
                map.insert(group.id, group.name);
            }
        }
        Ok(map)
    }

    /// Id→name map over every group the user belongs to.
    pub async fn group_name_map_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<HashMap<GroupId, String>, GroupError> {
        let group_ids = self.store.find_group_ids_by_user(user_id).await?;
        self.group_name_map(&group_ids).await
    }

    /// Single-group name lookup, `None` when the group is gone.
    pub async fn group_name(&self, group_id: &GroupId) -> Result<Option<String>, GroupError> {
        Ok(self.store.find_group(group_id).await?.map(|g| g.name))
    }

    /// Group attributes plus the resolved member list.
    ///
    /// Fails with `GroupNotFound` only when the group record is absent,
    /// independent of whether memberships resolve.
    pub async fn group_data(&self, group_id: &GroupId) -> Result<GroupData, GroupError> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or(GroupError::GroupNotFound)?;

        let memberships = self.store.find_memberships_by_group(group_id).await?;
        let members = self.resolve_members(memberships).await?;

        Ok(GroupData { group, members })
    }

    async fn resolve_members(
        &self,
        memberships: Vec<Membership>,
    ) -> Result<Vec<MemberSummary>, GroupError> {
        let user_ids: Vec<UserId> = memberships.iter().map(|m| m.user_id).collect();
        let profiles = self.directory.find_users(&user_ids).await?;
        let by_id: HashMap<UserId, UserProfile> =
            profiles.into_iter().map(|p| (p.user_id, p)).collect();

        Ok(memberships
            .into_iter()
            .filter_map(|m| {
                by_id.get(&m.user_id).map(|p| MemberSummary {
                    user_id: m.user_id,
                    email: p.email.clone(),
                    display_name: p.display_name.clone(),
                    role: m.role,
                    joined_at: m.joined_at,
                })
            })
            .collect())
    }
}
