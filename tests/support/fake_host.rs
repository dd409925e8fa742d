//! Shared fake host for the scenario tests in this directory. The actual
//! in-memory tree lives in `reconciler_core::test_support`, alongside the
//! crate it exercises; this just gives the integration tests a stable,
//! locally-scoped name to import.

pub use reconciler_core::test_support::{TestHost, TestNode};
