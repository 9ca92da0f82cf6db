//! # Notifier Testing Utils
//!
//! Shared testing utilities for the tranche notifier workspace.
//!
//! - **Mocks**: in-memory implementations of every capability trait
//!   (registry, token contracts, delivery gateway, wallet provider) with
//!   call counters and scripted failures
//! - **Builders**: registry documents and instruments with sensible defaults
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! notifier-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
