//! Storage abstraction for splitpot.
//!
//! Backend crates (e.g., splitpot-store-sqlite, splitpot-store-postgres)
//! implement the [`GroupStore`] and [`UserDirectory`] traits so the
//! membership core doesn't depend on any specific database engine or schema
//! details.

use thiserror::Error;

mod store;
mod types;

pub use store::{GroupStore, UserDirectory};
pub use types::*;

#[cfg(feature = "test-support")]
pub use store::{MockGroupStore, MockUserDirectory};

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}
