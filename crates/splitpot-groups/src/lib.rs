//! Group membership core for splitpot.
//!
//! Three components over the [`splitpot_storage`] contracts:
//! - [`GroupLifecycle`] sequences multi-step writes (create-then-enroll,
//!   cascading delete) and compensates on partial failure.
//! - [`MembershipManager`] enforces the enrollment/removal invariants,
//!   including the cascade when the last member leaves.
//! - [`AggregationService`] builds the derived read views (member lists,
//!   per-user group lists, id→name maps) on every call.
//!
//! The acting user is always an explicit parameter; the core carries no
//! session state. Authorization and balance checks plug in through the
//! [`hooks`] traits.

mod aggregation;
mod error;
pub mod hooks;
mod lifecycle;
mod membership;
mod notify;
mod views;

pub use aggregation::AggregationService;
pub use error::GroupError;
pub use lifecycle::{GroupLifecycle, GroupUpdate, NewGroup};
pub use membership::MembershipManager;
pub use views::{GroupData, GroupSummary, MemberSummary};

#[cfg(test)]
mod tests;
