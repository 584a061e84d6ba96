//! Integration test crate for the Atlus competition engine.
//!
//! This crate has no library code. It only contains integration tests
//! that exercise submission flows against a file-backed database, with
//! several connections racing on the same store.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p atlus-integration-tests
//! ```
