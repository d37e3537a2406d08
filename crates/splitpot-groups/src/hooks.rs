//! Pluggable policy hooks.
//!
//! The core's job is graph integrity, not accounting or authorization; those
//! policies plug in here. Outer layers supply real implementations (the
//! expense ledger for settlement checks, the permission service for delete
//! rights); the defaults allow everything.

use crate::GroupError;
use splitpot_storage::{GroupId, UserId};

/// Consulted before a membership is deleted.
///
/// The expected veto is [`GroupError::PendingSettlement`], raised by the
/// ledger collaborator when the departing member still owes money. The core
/// never computes balances itself.
#[async_trait::async_trait]
pub trait RemovalPrecondition: Send + Sync {
    async fn check(&self, group_id: &GroupId, user_id: &UserId) -> Result<(), GroupError>;
}

/// Default precondition: every removal is allowed.
pub struct AllowRemoval;

#[async_trait::async_trait]
impl RemovalPrecondition for AllowRemoval {
    async fn check(&self, _group_id: &GroupId, _user_id: &UserId) -> Result<(), GroupError> {
        Ok(())
    }
}

/// Consulted before a group cascade delete.
///
/// The expected veto is [`GroupError::NotAuthorized`], raised when the acting
/// user lacks the admin role.
#[async_trait::async_trait]
pub trait DeleteAuthorization: Send + Sync {
    async fn authorize(&self, group_id: &GroupId, acting_user: &UserId) -> Result<(), GroupError>;
}

/// Default authorization: every delete is allowed.
pub struct AllowDelete;

#[async_trait::async_trait]
impl DeleteAuthorization for AllowDelete {
    async fn authorize(
        &self,
        _group_id: &GroupId,
        _acting_user: &UserId,
    ) -> Result<(), GroupError> {
        Ok(())
    }
}
