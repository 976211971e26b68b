//! Integration tests
//!
//! - `store_test` - persistence and optimistic appends
//! - `collab_test` - the backtrack protocol through the service
//! - `scenario_test` - the four-step collaboration walkthrough
//! - `app_test` - application lifecycle and broadcasting
//! - `persistence_test` - recovery from failed appends

mod app_test;
mod collab_test;
mod persistence_test;
mod scenario_test;
mod store_test;
