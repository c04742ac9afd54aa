//! Call tree node.
//!
//! A node aggregates every sample that shares one root-to-node call path
//! within an execution context. Its span covers the earliest and latest
//! timestamp at which that path was observed.

use super::frame::{image_base_name, Frame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Call tree forests keyed by execution context (thread id)
///
/// A `BTreeMap` keeps iteration order stable across runs.
pub type CallTrees = BTreeMap<u64, Vec<Node>>;

/// A node of a call tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Function name
    pub name: String,

    /// Image base name (no directory components)
    pub package: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_addr: Option<String>,

    #[serde(default)]
    pub is_application: bool,

    /// Hash of the full root-to-node identity path
    pub fingerprint: u64,

    pub start_ns: u64,
    pub end_ns: u64,

    /// Always `end_ns - start_ns`
    pub duration_ns: u64,

    /// Samples whose path passes through or ends at this node
    pub sample_count: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Node {
    /// Create a node for `frame` covering `[start, end]`
    ///
    /// The node starts with one sample: nodes are only ever created
    /// because a sample's path reached them.
    pub fn from_frame(frame: &Frame, start: u64, end: u64, fingerprint: u64) -> Self {
        Self {
            name: frame.name.clone(),
            package: image_base_name(&frame.image).to_string(),
            path: frame.path.clone(),
            line: frame.line,
            instruction_addr: frame.instruction_addr.clone(),
            is_application: frame.is_application(),
            fingerprint,
            start_ns: start,
            end_ns: end,
            duration_ns: end.saturating_sub(start),
            sample_count: 1,
            children: Vec::new(),
        }
    }

    /// Move the end of the span to `t` and recompute the duration
    pub fn set_duration(&mut self, t: u64) {
        self.end_ns = t;
        self.duration_ns = self.end_ns.saturating_sub(self.start_ns);
    }

    /// Account for one more sample observed on this path at `t`
    pub fn record_sample(&mut self, t: u64) {
        self.sample_count += 1;
        if t < self.start_ns {
            self.start_ns = t;
            self.duration_ns = self.end_ns.saturating_sub(self.start_ns);
        }
        if t > self.end_ns {
            self.set_duration(t);
        }
    }

    /// True when the frame could not be symbolicated
    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    /// Samples that ended exactly at this node
    pub fn self_sample_count(&self) -> u64 {
        let through_children: u64 = self.children.iter().map(|c| c.sample_count).sum();
        self.sample_count.saturating_sub(through_children)
    }

    /// Identity of this node as a frame
    pub fn frame(&self) -> Frame {
        Frame {
            name: self.name.clone(),
            image: self.package.clone(),
            path: self.path.clone(),
            line: self.line,
            instruction_addr: self.instruction_addr.clone(),
            in_app: Some(self.is_application),
        }
    }

    /// Visit this node and its descendants depth-first, parents first
    ///
    /// The callback receives each node and its depth relative to `self`.
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&Node, usize),
    {
        self.walk_at(0, visit);
    }

    fn walk_at<F>(&self, depth: usize, visit: &mut F)
    where
        F: FnMut(&Node, usize),
    {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }
}
