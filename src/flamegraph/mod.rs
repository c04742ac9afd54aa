//! Cross-profile flamegraph aggregation and rendering.
//!
//! This module merges the call trees of several profiles into one
//! weighted sample set over a shared frame table, and renders it as an
//! SVG or a text summary.

pub mod generator;
pub mod summary;
pub mod svg;

// Re-export main types
pub use generator::{
    generate_flamegraph, Flamegraph, FlamegraphAggregator, FlamegraphConfig, FrameTable,
    MergeTree, SampleSet,
};
pub use summary::generate_text_summary;
pub use svg::render_svg;
