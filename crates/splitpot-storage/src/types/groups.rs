//! Group and membership record types.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use super::{GroupId, UserId};

/// Group record
#[derive(Clone, Debug)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Insert-or-update payload for a group.
///
/// `id: None` inserts a new group with a generated identifier; `id: Some`
/// updates the existing row and fails with `StoreError::NotFound` when no
/// such row exists.
#[derive(Clone, Debug)]
pub struct GroupDraft {
    pub id: Option<GroupId>,
    pub name: String,
    pub created_by: UserId,
}

/// Membership record (the group↔user join row)
#[derive(Clone, Debug)]
pub struct Membership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MembershipRole,
    pub joined_at: DateTime<Utc>,
}

/// Parameters for persisting a new membership
#[derive(Clone, Debug)]
pub struct NewMembership {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MembershipRole,
}

/// Outcome of a membership delete, computed atomically with the delete so
/// callers can act on the remaining count without a read-modify-write race.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipRemoval {
    /// Whether a row was actually removed.
    pub removed: bool,
    /// Memberships left in the group after the delete.
    pub remaining: i64,
}

/// Role a user holds within a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MembershipRole {
    /// The creator's role; carries lifecycle rights enforced by outer layers.
    Admin,
    Member,
}

/// Error type for parsing MembershipRole from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl std::fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid membership role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for MembershipRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MembershipRole::Admin),
            "member" => Ok(MembershipRole::Member),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipRole::Admin => "admin",
            MembershipRole::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, MembershipRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(MembershipRole::Admin.as_str(), "admin");
        assert_eq!(MembershipRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(
            "admin".parse::<MembershipRole>().unwrap(),
            MembershipRole::Admin
        );
        assert_eq!(
            "member".parse::<MembershipRole>().unwrap(),
            MembershipRole::Member
        );
    }

    #[test]
    fn test_role_parse_invalid() {
        assert!("invalid".parse::<MembershipRole>().is_err());
        assert!("Admin".parse::<MembershipRole>().is_err()); // Case sensitive
        assert!("".parse::<MembershipRole>().is_err());
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [MembershipRole::Admin, MembershipRole::Member] {
            let s = role.as_str();
            let parsed: MembershipRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_is_admin() {
        assert!(MembershipRole::Admin.is_admin());
        assert!(!MembershipRole::Member.is_admin());
    }

    #[test]
    fn test_parse_role_error_display() {
        let err = ParseRoleError("owner".to_string());
        assert!(err.to_string().contains("owner"));
    }
}
