//! Sample-based profile format.
//!
//! Frames, stacks and samples are stored as separate tables: a stack is a
//! leaf-first list of frame indices and a sample points at one stack.
//! This is also the common shape every other format is normalized into.

use super::profile::ProfileInterface;
use super::value::{lenient_opt_u64, lenient_u64};
use crate::aggregator::build_call_trees;
use crate::model::{CallTrees, Frame};
use crate::utils::error::MalformedTraceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped capture of a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Nanoseconds since the start of the profile
    #[serde(
        default,
        rename = "elapsed_since_start_ns",
        alias = "relative_timestamp_ns",
        deserialize_with = "lenient_u64"
    )]
    pub timestamp_ns: u64,

    /// Index into the stack table
    pub stack_id: usize,

    /// Execution context the sample was taken on
    #[serde(default, deserialize_with = "lenient_u64")]
    pub thread_id: u64,
}

impl Sample {
    pub fn new(timestamp_ns: u64, stack_id: usize) -> Self {
        Self {
            timestamp_ns,
            stack_id,
            thread_id: crate::utils::config::DEFAULT_THREAD_ID,
        }
    }

    pub fn on_thread(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// Frame, stack and sample tables of one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub frames: Vec<Frame>,

    /// Leaf-first frame indices
    #[serde(default)]
    pub stacks: Vec<Vec<usize>>,

    /// Samples in arrival order
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl Trace {
    /// Time between the earliest and the latest sample
    pub fn duration_ns(&self) -> u64 {
        span_ns(self.samples.iter().map(|sample| sample.timestamp_ns))
    }
}

/// Difference between the largest and smallest timestamp, 0 when empty
pub(crate) fn span_ns(timestamps: impl Iterator<Item = u64>) -> u64 {
    let (min, max) = timestamps.fold((u64::MAX, 0), |(min, max), t| (min.min(t), max.max(t)));
    max.saturating_sub(min)
}

/// Transaction the profile was captured for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub trace_id: String,

    #[serde(
        default,
        deserialize_with = "lenient_opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_thread_id: Option<u64>,
}

/// A profile in the sample-based format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleProfile {
    pub event_id: String,

    #[serde(default)]
    pub organization_id: u64,

    #[serde(default)]
    pub project_id: u64,

    #[serde(default)]
    pub platform: String,

    /// Format version; always non-empty for this format
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,

    #[serde(rename = "profile")]
    pub trace: Trace,
}

impl ProfileInterface for SampleProfile {
    fn id(&self) -> &str {
        &self.event_id
    }

    fn organization_id(&self) -> u64 {
        self.organization_id
    }

    fn project_id(&self) -> u64 {
        self.project_id
    }

    fn platform(&self) -> &str {
        &self.platform
    }

    fn active_thread_id(&self) -> Option<u64> {
        self.transaction.as_ref().and_then(|t| t.active_thread_id)
    }

    fn transaction(&self) -> Option<Transaction> {
        self.transaction.clone()
    }

    fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn received(&self) -> Option<DateTime<Utc>> {
        self.received
    }

    fn duration_ns(&self) -> u64 {
        self.trace.duration_ns()
    }

    fn sample_count(&self) -> usize {
        self.trace.samples.len()
    }

    fn call_trees(&self) -> Result<CallTrees, MalformedTraceError> {
        build_call_trees(&self.trace)
    }

    fn normalize(&mut self) {
        for frame in &mut self.trace.frames {
            frame.normalize();
        }
    }
}
