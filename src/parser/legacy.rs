//! Legacy flat profile format.
//!
//! Every sample carries its full stack inline. Before building call
//! trees the samples are normalized into the table-based shape of the
//! sample format: identical frames and identical stacks are deduplicated
//! in first-seen order.

use super::profile::ProfileInterface;
use super::sample::{span_ns, Sample, Trace, Transaction};
use super::value::{lenient_opt_u64, lenient_u64};
use crate::aggregator::build_call_trees;
use crate::model::{CallTrees, Frame};
use crate::utils::error::MalformedTraceError;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One legacy sample with its inline, leaf-first stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySample {
    #[serde(default)]
    pub frames: Vec<Frame>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub relative_timestamp_ns: u64,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub thread_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySampledProfile {
    #[serde(default)]
    pub samples: Vec<LegacySample>,
}

/// A profile in the legacy format (no `version` field)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyProfile {
    pub profile_id: String,

    #[serde(default)]
    pub organization_id: u64,

    #[serde(default)]
    pub project_id: u64,

    #[serde(default)]
    pub platform: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transaction_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transaction_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trace_id: String,

    /// App release, reported as `version_name` by older SDKs
    #[serde(default, alias = "version_name", skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "lenient_opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_thread_id: Option<u64>,

    #[serde(default)]
    pub sampled_profile: LegacySampledProfile,
}

impl LegacyProfile {
    /// Normalize inline stacks into frame/stack/sample tables
    pub fn to_trace(&self) -> Trace {
        let mut trace = Trace::default();
        let mut frame_ids: HashMap<&Frame, usize> = HashMap::new();
        let mut stack_ids: HashMap<Vec<usize>, usize> = HashMap::new();

        for sample in &self.sampled_profile.samples {
            let stack: Vec<usize> = sample
                .frames
                .iter()
                .map(|frame| {
                    *frame_ids.entry(frame).or_insert_with(|| {
                        trace.frames.push(frame.clone());
                        trace.frames.len() - 1
                    })
                })
                .collect();

            let stack_id = *stack_ids.entry(stack).or_insert_with_key(|stack| {
                trace.stacks.push(stack.clone());
                trace.stacks.len() - 1
            });

            trace.samples.push(
                Sample::new(sample.relative_timestamp_ns, stack_id).on_thread(sample.thread_id),
            );
        }

        debug!(
            "Normalized legacy profile {}: {} frames, {} stacks, {} samples",
            self.profile_id,
            trace.frames.len(),
            trace.stacks.len(),
            trace.samples.len()
        );

        trace
    }
}

impl ProfileInterface for LegacyProfile {
    fn id(&self) -> &str {
        &self.profile_id
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
        self.active_thread_id
    }

    fn transaction(&self) -> Option<Transaction> {
        if self.transaction_name.is_empty() && self.transaction_id.is_empty() {
            return None;
        }
        Some(Transaction {
            id: self.transaction_id.clone(),
            name: self.transaction_name.clone(),
            trace_id: self.trace_id.clone(),
            active_thread_id: self.active_thread_id,
        })
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
        span_ns(
            self.sampled_profile
                .samples
                .iter()
                .map(|sample| sample.relative_timestamp_ns),
        )
    }

    fn sample_count(&self) -> usize {
        self.sampled_profile.samples.len()
    }

    fn call_trees(&self) -> Result<CallTrees, MalformedTraceError> {
        build_call_trees(&self.to_trace())
    }

    fn normalize(&mut self) {
        for sample in &mut self.sampled_profile.samples {
            for frame in &mut sample.frames {
                frame.normalize();
            }
        }
    }
}
