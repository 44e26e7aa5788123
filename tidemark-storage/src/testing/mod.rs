//! Test doubles for storage collaborators
//!
//! Available to other crates through the `testing` feature.

pub mod mocks;

pub use mocks::{MockChangelog, MockCollectionHandle, MockDatabaseHandle};
