//! Cross-profile flamegraph aggregation.
//!
//! Call tree forests from several profiles are merged into one weighted
//! sample set over a shared, deduplicated frame table:
//!
//! - frames are keyed by `(image, name)` and indexed in first-seen order
//! - identical call paths from different profiles merge into one entry
//! - each entry's weight is the number of samples that ended exactly on
//!   that path, and its origins are the profiles that contributed them
//!
//! Every collection here is ordered by insertion; hash maps are only used
//! for lookups, so the output depends on nothing but the input order.

use crate::aggregator::collapse_forest;
use crate::model::{Frame, Node};
use crate::parser::{main_thread_id, Profile, ProfileInterface};
use crate::utils::config::{DEFAULT_FLAMEGRAPH_TITLE, DEFAULT_FLAMEGRAPH_WIDTH};
use crate::utils::error::MalformedTraceError;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Flamegraph configuration
#[derive(Debug, Clone)]
pub struct FlamegraphConfig {
    /// Collapse each profile's call trees before merging
    pub collapse: bool,
    pub title: String,
    pub width: usize,
}

impl Default for FlamegraphConfig {
    fn default() -> Self {
        Self {
            collapse: true,
            title: DEFAULT_FLAMEGRAPH_TITLE.to_string(),
            width: DEFAULT_FLAMEGRAPH_WIDTH,
        }
    }
}

impl FlamegraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_collapse(mut self, collapse: bool) -> Self {
        self.collapse = collapse;
        self
    }
}

/// Deduplicated frames in first-seen order
#[derive(Debug, Default)]
pub struct FrameTable {
    frames: Vec<Frame>,
    index: HashMap<(String, String), usize>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the node's frame identity, inserting it when unseen
    pub fn index_of(&mut self, node: &Node) -> usize {
        let key = (node.package.clone(), node.name.clone());
        if let Some(&index) = self.index.get(&key) {
            return index;
        }

        let index = self.frames.len();
        self.frames.push(node.frame());
        self.index.insert(key, index);
        index
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

/// Weighted stacks with the profiles each one came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSet {
    /// Root-first frame table indices
    pub samples: Vec<Vec<usize>>,
    pub weights: Vec<u64>,
    pub origins: Vec<Vec<usize>>,
}

impl SampleSet {
    pub fn total_weight(&self) -> u64 {
        self.weights.iter().sum()
    }
}

struct MergeNode {
    frame: usize,
    weight: u64,
    origins: Vec<usize>,
    children: Vec<usize>,
}

/// Trie of call paths merged across profiles
#[derive(Default)]
pub struct MergeTree {
    nodes: Vec<MergeNode>,
    roots: Vec<usize>,
    // (parent slot, frame index) -> slot
    lookup: HashMap<(Option<usize>, usize), usize>,
}

impl MergeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a forest contributed by the profile at `profile_index`
    pub fn add_forest(&mut self, frames: &mut FrameTable, forest: &[Node], profile_index: usize) {
        for root in forest {
            self.add_node(frames, None, root, profile_index);
        }
    }

    fn add_node(
        &mut self,
        frames: &mut FrameTable,
        parent: Option<usize>,
        node: &Node,
        profile_index: usize,
    ) {
        let frame = frames.index_of(node);
        let slot = self.slot(parent, frame);

        let self_count = node.self_sample_count();
        if self_count > 0 {
            let merged = &mut self.nodes[slot];
            merged.weight += self_count;
            if !merged.origins.contains(&profile_index) {
                merged.origins.push(profile_index);
            }
        }

        for child in &node.children {
            self.add_node(frames, Some(slot), child, profile_index);
        }
    }

    fn slot(&mut self, parent: Option<usize>, frame: usize) -> usize {
        if let Some(&slot) = self.lookup.get(&(parent, frame)) {
            return slot;
        }

        let slot = self.nodes.len();
        self.nodes.push(MergeNode {
            frame,
            weight: 0,
            origins: Vec::new(),
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(slot),
            None => self.roots.push(slot),
        }
        self.lookup.insert((parent, frame), slot);
        slot
    }

    /// Flatten into weighted root-first stacks
    ///
    /// Paths are emitted depth-first with children before their parent;
    /// paths with no samples of their own are skipped.
    pub fn into_sample_set(self) -> SampleSet {
        let mut set = SampleSet::default();
        let mut path = Vec::new();
        for &root in &self.roots {
            self.emit(root, &mut path, &mut set);
        }
        set
    }

    fn emit(&self, slot: usize, path: &mut Vec<usize>, set: &mut SampleSet) {
        let node = &self.nodes[slot];
        path.push(node.frame);

        for &child in &node.children {
            self.emit(child, path, set);
        }

        if node.weight > 0 {
            set.samples.push(path.clone());
            set.weights.push(node.weight);
            set.origins.push(node.origins.clone());
        }

        path.pop();
    }
}

/// Aggregated flamegraph over one or more profiles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flamegraph {
    pub frames: Vec<Frame>,
    pub profile_ids: Vec<String>,
    /// Root-first frame table indices
    pub samples: Vec<Vec<usize>>,
    pub weights: Vec<u64>,
    /// Profile indices that contributed to each sample
    pub sample_origins: Vec<Vec<usize>>,
    /// Sum of `weights`
    pub end_value: u64,
    /// Profile indices whose call trees could not be built
    pub failed_profiles: Vec<usize>,
}

/// Merges collapsed forests from several profiles into one flamegraph
///
/// Profiles must be added in a fixed order: it decides frame indices and
/// the order of merged samples.
#[derive(Default)]
pub struct FlamegraphAggregator {
    frames: FrameTable,
    tree: MergeTree,
    profile_ids: Vec<String>,
    failed_profiles: Vec<usize>,
}

impl FlamegraphAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one profile's forest
    pub fn add_call_tree(&mut self, profile_id: impl Into<String>, forest: &[Node]) {
        let profile_index = self.profile_ids.len();
        self.profile_ids.push(profile_id.into());
        self.tree.add_forest(&mut self.frames, forest, profile_index);
    }

    /// Record a profile that contributes no samples because it failed
    pub fn add_failed_profile(&mut self, profile_id: impl Into<String>) {
        self.failed_profiles.push(self.profile_ids.len());
        self.profile_ids.push(profile_id.into());
    }

    /// Add the outcome of building one profile's forest
    pub fn add_result(
        &mut self,
        profile_id: impl Into<String>,
        forest: Result<&[Node], &MalformedTraceError>,
    ) {
        let profile_id = profile_id.into();
        match forest {
            Ok(forest) => self.add_call_tree(profile_id, forest),
            Err(e) => {
                warn!("Profile {} contributes no samples: {}", profile_id, e);
                self.add_failed_profile(profile_id);
            }
        }
    }

    /// Build a profile's call trees and add its main execution context
    ///
    /// The main context is the profile's active thread when it has
    /// samples, otherwise the smallest thread id.
    pub fn add_profile(&mut self, profile: &dyn ProfileInterface, collapse: bool) {
        let call_trees = match profile.call_trees() {
            Ok(call_trees) => call_trees,
            Err(e) => return self.add_result(profile.id(), Err(&e)),
        };

        let forest = main_thread_id(profile.active_thread_id(), &call_trees)
            .and_then(|thread_id| call_trees.get(&thread_id))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if collapse {
            self.add_call_tree(profile.id(), &collapse_forest(forest));
        } else {
            self.add_call_tree(profile.id(), forest);
        }
    }

    pub fn finish(self) -> Flamegraph {
        let set = self.tree.into_sample_set();
        let end_value = set.total_weight();

        debug!(
            "Aggregated {} profiles into {} samples over {} frames",
            self.profile_ids.len(),
            set.samples.len(),
            self.frames.len()
        );

        Flamegraph {
            frames: self.frames.into_frames(),
            profile_ids: self.profile_ids,
            samples: set.samples,
            weights: set.weights,
            sample_origins: set.origins,
            end_value,
            failed_profiles: self.failed_profiles,
        }
    }
}

/// Build a flamegraph from profiles
///
/// **Public** - main entry point for cross-profile aggregation
///
/// # Arguments
/// * `profiles` - Profiles in merge order
/// * `config` - Whether to collapse each forest before merging
///
/// # Returns
/// The merged flamegraph. Profiles whose call trees cannot be built are
/// listed in `failed_profiles` and contribute no samples.
pub fn generate_flamegraph(profiles: &[Profile], config: &FlamegraphConfig) -> Flamegraph {
    info!("Aggregating flamegraph from {} profiles", profiles.len());

    let mut aggregator = FlamegraphAggregator::new();
    for profile in profiles {
        aggregator.add_profile(profile, config.collapse);
    }

    let flamegraph = aggregator.finish();
    if !flamegraph.failed_profiles.is_empty() {
        warn!(
            "{} of {} profiles failed and were left out",
            flamegraph.failed_profiles.len(),
            flamegraph.profile_ids.len()
        );
    }
    flamegraph
}
