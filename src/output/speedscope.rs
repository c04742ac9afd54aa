//! Speedscope sampled-profile encoding.
//!
//! Output layout:
//!
//! ```text
//! { "shared":   { "frames": [...], "profileIDs": [...] },
//!   "profiles": [ { "type": "sampled", "unit": "count", "endValue", "isMainThread",
//!                   "samples", "samplesProfiles", "weights" } ] }
//! ```
//!
//! Only structs and vectors are serialized, so the bytes produced for a
//! given input are always the same.

use crate::flamegraph::{Flamegraph, FrameTable, MergeTree};
use crate::model::{CallTrees, Frame};
use crate::utils::config::{SAMPLED_PROFILE_TYPE, SAMPLED_PROFILE_UNIT};
use crate::utils::error::OutputError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Top-level speedscope document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub shared: SharedData,
    pub profiles: Vec<SampledProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedData {
    pub frames: Vec<SpeedscopeFrame>,

    #[serde(rename = "profileIDs")]
    pub profile_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedscopeFrame {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_application: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<&Frame> for SpeedscopeFrame {
    fn from(frame: &Frame) -> Self {
        Self {
            name: frame.name.clone(),
            image: frame.image_base_name().to_string(),
            is_application: frame.is_application(),
            file: frame.path.clone(),
            line: (frame.line > 0).then_some(frame.line),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledProfile {
    #[serde(rename = "type")]
    pub profile_type: String,

    pub unit: String,

    /// Thread label, only set for single-profile output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Sum of `weights`
    pub end_value: u64,

    pub is_main_thread: bool,

    /// Root-first frame indices
    pub samples: Vec<Vec<usize>>,

    /// Indices into `shared.profileIDs`, parallel to `samples`
    pub samples_profiles: Vec<Vec<usize>>,

    pub weights: Vec<u64>,
}

impl SampledProfile {
    fn new(name: Option<String>, is_main_thread: bool) -> Self {
        Self {
            profile_type: SAMPLED_PROFILE_TYPE.to_string(),
            unit: SAMPLED_PROFILE_UNIT.to_string(),
            name,
            is_main_thread,
            ..Self::default()
        }
    }
}

/// Encode an aggregated flamegraph as one sampled profile
///
/// **Public** - main entry point for flamegraph output
pub fn encode_flamegraph(flamegraph: &Flamegraph) -> Output {
    let mut profile = SampledProfile::new(None, true);
    profile.end_value = flamegraph.end_value;
    profile.samples = flamegraph.samples.clone();
    profile.samples_profiles = flamegraph.sample_origins.clone();
    profile.weights = flamegraph.weights.clone();

    Output {
        shared: SharedData {
            frames: flamegraph.frames.iter().map(SpeedscopeFrame::from).collect(),
            profile_ids: flamegraph.profile_ids.clone(),
        },
        profiles: vec![profile],
    }
}

/// Encode the call trees of a single profile
///
/// Each execution context becomes its own sampled profile, merged as a
/// one-profile flamegraph; all of them share one frame table.
///
/// # Arguments
/// * `profile_id` - Id written to `shared.profileIDs`
/// * `call_trees` - Forests per thread, typically already collapsed
/// * `main_thread` - Thread flagged with `isMainThread`
pub fn encode_call_trees(
    profile_id: &str,
    call_trees: &CallTrees,
    main_thread: Option<u64>,
) -> Output {
    let mut frames = FrameTable::new();
    let mut profiles = Vec::with_capacity(call_trees.len());

    for (&thread_id, forest) in call_trees {
        let mut tree = MergeTree::new();
        tree.add_forest(&mut frames, forest, 0);
        let set = tree.into_sample_set();

        let mut profile = SampledProfile::new(
            Some(format!("thread {}", thread_id)),
            main_thread == Some(thread_id),
        );
        profile.end_value = set.total_weight();
        profile.samples = set.samples;
        profile.samples_profiles = set.origins;
        profile.weights = set.weights;
        profiles.push(profile);
    }

    debug!(
        "Encoded profile {}: {} threads, {} frames",
        profile_id,
        profiles.len(),
        frames.len()
    );

    Output {
        shared: SharedData {
            frames: frames
                .into_frames()
                .iter()
                .map(SpeedscopeFrame::from)
                .collect(),
            profile_ids: vec![profile_id.to_string()],
        },
        profiles,
    }
}

/// Serialize to compact JSON bytes
pub fn to_json_bytes(output: &Output) -> Result<Vec<u8>, OutputError> {
    serde_json::to_vec(output).map_err(OutputError::SerializationFailed)
}
