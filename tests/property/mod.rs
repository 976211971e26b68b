//! Property-based tests
//!
//! - `rebase_proptest` - laws of the rebase function
//! - `change_proptest` - the change algebra

mod change_proptest;
