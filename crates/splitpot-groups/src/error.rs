//! Error type for the membership core.

use splitpot_storage::StoreError;
use thiserror::Error;

/// Typed failures reported to the request-handling layer.
///
/// Mapping these to wire status codes is the caller's job.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Missing/malformed identifiers or empty required fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The group does not exist (or has no members left, which is the same
    /// thing).
    #[error("group not found")]
    GroupNotFound,

    /// The (group, user) pair already exists.
    #[error("user is already a member of this group")]
    AlreadyMember,

    /// The ledger collaborator vetoed the removal.
    #[error("member has unsettled balances in this group")]
    PendingSettlement,

    /// The delete-authorization hook vetoed the cascade.
    #[error("not authorized to delete this group")]
    NotAuthorized,

    /// Storage-layer failure not otherwise classified.
    #[error("storage error: {0}")]
    Persistence(#[from] StoreError),
}
