//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Note: AppState holds concrete Postgres adapters, so handler-level tests
//! would need a generic state. Service-level tests with these mocks cover
//! the behavior instead.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
