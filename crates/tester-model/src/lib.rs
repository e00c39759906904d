//! Plain data types shared by the tester crates.
//!
//! Nothing here performs I/O or owns a task: names, sets and state enums only.

mod domain;
pub use domain::*;
