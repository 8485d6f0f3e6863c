//! Shared test utilities for the SensorThings workspace.
//!
//! This crate provides common testing infrastructure including:
//! - JSON payload fixtures for every entity set
//! - Observation series generators
//! - Assertion helpers for error kinds
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, observation_series};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Assert that a `Result` failed with the given error kind.
///
/// The error type must have a `kind()` method, as the core error does.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_err_kind;
///
/// assert_err_kind!(services.create(&mut ctx, kind, body), ErrorKind::InvalidRequest);
/// ```
#[macro_export]
macro_rules! assert_err_kind {
    ($result:expr, $kind:expr) => {{
        match $result {
            Ok(_) => panic!("expected {:?} error, got Ok", $kind),
            Err(err) => assert_eq!(err.kind(), $kind, "unexpected error: {}", err),
        }
    }};
}
