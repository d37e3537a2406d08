//! Type definitions for splitpot storage.

mod groups;
mod ids;
mod users;

// Re-export all types from submodules
pub use groups::*;
pub use ids::*;
pub use users::*;
