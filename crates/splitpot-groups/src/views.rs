//! Derived read views.
//!
//! Rebuilt on every read, never cached by the core.

use chrono::{DateTime, Utc};
use splitpot_storage::{Group, GroupId, MembershipRole, UserId};

/// One resolved member of a group.
#[derive(Clone, Debug)]
pub struct MemberSummary {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

/// Lightweight group reference for per-user group lists.
#[derive(Clone, Debug)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
}

/// Group attributes combined with the resolved member list.
#[derive(Clone, Debug)]
pub struct GroupData {
    pub group: Group,
    pub members: Vec<MemberSummary>,
}
