//! Aggregation of stack samples into call trees.
//!
//! This module transforms a profile's flat sample sequence into:
//! - Call tree forests per execution context
//! - Collapsed forests with redundant and low-signal nodes removed

pub mod call_tree;
pub mod collapse;

// Re-export main types and functions
pub use call_tree::{build_call_trees, CallTreeBuilder};
pub use collapse::{collapse_call_trees, collapse_forest};
