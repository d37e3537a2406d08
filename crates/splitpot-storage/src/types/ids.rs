//! Strongly-typed identifiers (avoid mixing strings/UUIDs arbitrarily).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

/// User identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl GroupId {
    /// A nil identifier never refers to a persisted group.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl UserId {
    /// A nil identifier never refers to a known user.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_debug() {
        let uuid = Uuid::new_v4();
        let group_id = GroupId(uuid);
        assert!(format!("{:?}", group_id).contains(&uuid.to_string()));
    }

    #[test]
    fn test_typed_ids_equality() {
        let uuid = Uuid::new_v4();
        let user_id1 = UserId(uuid);
        let user_id2 = UserId(uuid);
        assert_eq!(user_id1, user_id2);

        let different_uuid = Uuid::new_v4();
        let user_id3 = UserId(different_uuid);
        assert_ne!(user_id1, user_id3);
    }

    #[test]
    fn test_typed_ids_hash() {
        use std::collections::HashSet;

        let uuid = Uuid::new_v4();
        let group_id1 = GroupId(uuid);
        let group_id2 = GroupId(uuid);

        let mut set = HashSet::new();
        set.insert(group_id1);
        assert!(set.contains(&group_id2));
    }

    #[test]
    fn test_nil_detection() {
        assert!(GroupId(Uuid::nil()).is_nil());
        assert!(UserId(Uuid::nil()).is_nil());
        assert!(!GroupId(Uuid::new_v4()).is_nil());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = serde_json::to_string(&GroupId(uuid)).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
    }
}
