//! User profile types resolved through the directory.

use chrono::{DateTime, Utc};

use super::UserId;

/// User profile record as the directory exposes it.
///
/// Profiles are owned by the identity subsystem; the membership core only
/// ever reads them.
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
