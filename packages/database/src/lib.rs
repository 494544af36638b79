#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Store contracts for points, locations, suggestions and votes.
//!
//! The analysis core only needs basic reads, writes and a query-by-radius,
//! so the persistence engine stays behind the traits in [`store`].
//! [`memory::MemoryStore`] implements every trait in process and backs the
//! server and the tests.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{LocationStore, PointStore, VoteStore};

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record referenced by id does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Requested id.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} '{id}' already exists")]
    Duplicate {
        /// Kind of record.
        entity: &'static str,
        /// Conflicting key.
        id: String,
    },

    /// A writer panicked while holding a store lock.
    #[error("Store lock poisoned: {name}")]
    Poisoned {
        /// Which collection was affected.
        name: &'static str,
    },
}
