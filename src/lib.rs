//! sampletree
//!
//! Call tree construction, collapsing and cross-profile flamegraph
//! aggregation for sampled CPU profiles, with speedscope output.
//!
//! The pipeline is:
//!
//! 1. [`parser`] reads a profile (sample or legacy format)
//! 2. [`aggregator`] builds per-thread call trees and collapses them
//! 3. [`flamegraph`] merges many profiles into one weighted sample set
//! 4. [`output`] encodes speedscope JSON or writes SVG
//!
//! This crate also provides the `sampletree` CLI.

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod model;
pub mod output;
pub mod parser;
pub mod utils;
