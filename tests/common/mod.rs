//! Shared test utilities for logsift integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Bundles are written to `tempfile` directories and are
//! removed when the returned guard drops.

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
