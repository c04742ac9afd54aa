//! Build call tree forests from a flat sequence of stack samples.
//!
//! Every execution context (thread) gets its own trie. Each sample walks
//! its stack from the root frame to the leaf; at every depth the child
//! matching the frame identity is reused (its count and span updated) or
//! created. Repeated occurrences of a path therefore share one chain of
//! nodes whether or not they were adjacent in time.
//!
//! The trie is an arena of nodes addressed by index and only turned into
//! an owned `Node` tree once all samples have been consumed.

use crate::model::{CallTrees, Frame, Node};
use crate::parser::sample::{Sample, Trace};
use crate::utils::error::MalformedTraceError;
use fnv::FnvHasher;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hasher;

struct TrieNode {
    node: Node,
    children: Vec<usize>,
}

/// Arena-backed trie for one execution context
#[derive(Default)]
struct ThreadTrie {
    nodes: Vec<TrieNode>,
    roots: Vec<usize>,
    // (parent slot, frame identity) -> slot
    lookup: HashMap<(Option<usize>, usize), usize>,
}

impl ThreadTrie {
    fn descend(
        &mut self,
        parent: Option<usize>,
        identity: usize,
        frame: &Frame,
        fingerprint: u64,
        timestamp_ns: u64,
    ) -> usize {
        if let Some(&slot) = self.lookup.get(&(parent, identity)) {
            self.nodes[slot].node.record_sample(timestamp_ns);
            return slot;
        }

        let slot = self.nodes.len();
        self.nodes.push(TrieNode {
            node: Node::from_frame(frame, timestamp_ns, timestamp_ns, fingerprint),
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(slot),
            None => self.roots.push(slot),
        }
        self.lookup.insert((parent, identity), slot);
        slot
    }

    fn into_forest(self) -> Vec<Node> {
        let ThreadTrie { nodes, roots, .. } = self;

        // Children are always allocated after their parent, so walking the
        // arena backwards finishes every subtree before it is attached.
        let mut built: Vec<Option<Node>> = Vec::with_capacity(nodes.len());
        built.resize_with(nodes.len(), || None);

        for (slot, TrieNode { mut node, children }) in nodes.into_iter().enumerate().rev() {
            node.children = children
                .into_iter()
                .filter_map(|child| built[child].take())
                .collect();
            built[slot] = Some(node);
        }

        roots
            .into_iter()
            .filter_map(|root| built[root].take())
            .collect()
    }
}

/// Incremental call tree builder for one profile
///
/// **Public** - used by profile formats to produce their call trees
pub struct CallTreeBuilder<'a> {
    frames: &'a [Frame],
    stacks: &'a [Vec<usize>],
    /// frame index -> identity id; frames sharing `(image, name)` share an id
    identities: Vec<usize>,
    threads: BTreeMap<u64, ThreadTrie>,
    samples_seen: usize,
}

impl<'a> CallTreeBuilder<'a> {
    /// Create a builder over a profile's frame and stack tables
    ///
    /// Stacks are leaf-first lists of indices into `frames`.
    pub fn new(frames: &'a [Frame], stacks: &'a [Vec<usize>]) -> Self {
        let mut ids: HashMap<(&str, &str), usize> = HashMap::new();
        let identities = frames
            .iter()
            .map(|frame| {
                let next = ids.len();
                *ids.entry(frame.identity()).or_insert(next)
            })
            .collect();

        Self {
            frames,
            stacks,
            identities,
            threads: BTreeMap::new(),
            samples_seen: 0,
        }
    }

    /// Add one sample to its execution context's trie
    ///
    /// # Errors
    /// * `MalformedTraceError::StackOutOfRange` - unknown stack id
    /// * `MalformedTraceError::FrameOutOfRange` - the stack references an unknown frame
    pub fn add_sample(&mut self, sample: &Sample) -> Result<(), MalformedTraceError> {
        let index = self.samples_seen;
        self.samples_seen += 1;

        let stack = self
            .stacks
            .get(sample.stack_id)
            .ok_or(MalformedTraceError::StackOutOfRange {
                sample: index,
                stack_id: sample.stack_id,
                stack_count: self.stacks.len(),
            })?;

        if let Some(&frame_index) = stack.iter().find(|&&i| i >= self.frames.len()) {
            return Err(MalformedTraceError::FrameOutOfRange {
                stack_id: sample.stack_id,
                frame_index,
                frame_count: self.frames.len(),
            });
        }

        if stack.is_empty() {
            debug!("Sample {} has an empty stack, skipping", index);
            return Ok(());
        }

        let trie = self.threads.entry(sample.thread_id).or_default();
        let mut hasher = FnvHasher::default();
        let mut parent = None;

        // Stacks are stored leaf-first; the trie grows from the root.
        for &frame_index in stack.iter().rev() {
            let frame = &self.frames[frame_index];
            frame.write_to_hash(&mut hasher);
            parent = Some(trie.descend(
                parent,
                self.identities[frame_index],
                frame,
                hasher.finish(),
                sample.timestamp_ns,
            ));
        }

        Ok(())
    }

    /// Add every sample in arrival order, stopping at the first malformed one
    pub fn extend<'s, I>(&mut self, samples: I) -> Result<(), MalformedTraceError>
    where
        I: IntoIterator<Item = &'s Sample>,
    {
        for sample in samples {
            self.add_sample(sample)?;
        }
        Ok(())
    }

    /// Materialize the forests, one per execution context
    pub fn finish(self) -> CallTrees {
        debug!(
            "Built call trees for {} threads from {} samples",
            self.threads.len(),
            self.samples_seen
        );

        self.threads
            .into_iter()
            .map(|(thread_id, trie)| (thread_id, trie.into_forest()))
            .collect()
    }
}

/// Build call trees for a whole trace
///
/// **Public** - main entry point for call tree construction
///
/// # Arguments
/// * `trace` - Normalized frame, stack and sample tables of one profile
///
/// # Returns
/// Forest per thread id. A trace without samples yields an empty map.
///
/// # Errors
/// * `MalformedTraceError` - a sample or stack points outside its table;
///   no partial result is returned
pub fn build_call_trees(trace: &Trace) -> Result<CallTrees, MalformedTraceError> {
    if trace.samples.is_empty() {
        debug!("Trace has no samples, returning empty call trees");
        return Ok(CallTrees::new());
    }

    let mut builder = CallTreeBuilder::new(&trace.frames, &trace.stacks);
    builder.extend(&trace.samples)?;
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(name: &str) -> Frame {
        Frame::new(name, "test.package")
    }

    fn trace(frames: Vec<Frame>, stacks: Vec<Vec<usize>>, samples: Vec<Sample>) -> Trace {
        Trace {
            frames,
            stacks,
            samples,
        }
    }

    fn check_containment(node: &Node) {
        assert_eq!(node.duration_ns, node.end_ns - node.start_ns);
        assert!(node.sample_count >= 1);
        for child in &node.children {
            assert!(node.start_ns <= child.start_ns, "{} starts after {}", node.name, child.name);
            assert!(child.end_ns <= node.end_ns, "{} ends before {}", node.name, child.name);
            assert!(child.sample_count <= node.sample_count);
            check_containment(child);
        }
    }

    #[test]
    fn test_non_adjacent_samples_share_a_chain() {
        // a -> b at 0 and 20, c at 10, a alone at 30
        let t = trace(
            vec![frame("a"), frame("b"), frame("c")],
            vec![vec![1, 0], vec![2], vec![0]],
            vec![
                Sample::new(0, 0),
                Sample::new(10, 1),
                Sample::new(20, 0),
                Sample::new(30, 2),
            ],
        );

        let trees = build_call_trees(&t).unwrap();
        let forest = &trees[&0];

        assert_eq!(forest.len(), 2);
        let a = &forest[0];
        assert_eq!(a.name, "a");
        assert_eq!(a.sample_count, 3);
        assert_eq!((a.start_ns, a.end_ns, a.duration_ns), (0, 30, 30));
        assert_eq!(a.self_sample_count(), 1);

        assert_eq!(a.children.len(), 1);
        let b = &a.children[0];
        assert_eq!(b.name, "b");
        assert_eq!(b.sample_count, 2);
        assert_eq!((b.start_ns, b.end_ns), (0, 20));

        let c = &forest[1];
        assert_eq!(c.name, "c");
        assert_eq!(c.sample_count, 1);
        assert_eq!(c.duration_ns, 0);

        for root in forest {
            check_containment(root);
        }
    }

    #[test]
    fn test_sample_conservation() {
        let t = trace(
            vec![frame("main"), frame("work"), frame("io"), frame("idle")],
            vec![vec![1, 0], vec![2, 1, 0], vec![0], vec![3]],
            vec![
                Sample::new(0, 0),
                Sample::new(1, 1),
                Sample::new(2, 1),
                Sample::new(3, 2),
                Sample::new(4, 3),
                Sample::new(5, 0),
            ],
        );

        let trees = build_call_trees(&t).unwrap();
        let forest = &trees[&0];

        let roots: u64 = forest.iter().map(|n| n.sample_count).sum();
        assert_eq!(roots, t.samples.len() as u64);

        let mut self_total = 0;
        for root in forest {
            root.walk(&mut |node, _| self_total += node.self_sample_count());
        }
        assert_eq!(self_total, t.samples.len() as u64);
    }

    #[test]
    fn test_threads_build_separate_forests() {
        let t = trace(
            vec![frame("a"), frame("b")],
            vec![vec![0], vec![1]],
            vec![
                Sample::new(0, 0).on_thread(7),
                Sample::new(0, 1).on_thread(3),
                Sample::new(10, 0).on_thread(7),
            ],
        );

        let trees = build_call_trees(&t).unwrap();
        assert_eq!(trees.keys().copied().collect::<Vec<_>>(), vec![3, 7]);
        assert_eq!(trees[&7][0].sample_count, 2);
        assert_eq!(trees[&3][0].name, "b");
    }

    #[test]
    fn test_same_path_same_fingerprint() {
        let t = trace(
            vec![frame("a"), frame("b"), Frame::new("b", "/other/install/test.package")],
            vec![vec![1, 0], vec![2, 0]],
            vec![Sample::new(0, 0).on_thread(1), Sample::new(5, 1).on_thread(2)],
        );

        let trees = build_call_trees(&t).unwrap();
        let one = &trees[&1][0];
        let two = &trees[&2][0];
        assert_eq!(one.fingerprint, two.fingerprint);
        assert_eq!(one.children[0].fingerprint, two.children[0].fingerprint);
        assert_ne!(one.fingerprint, one.children[0].fingerprint);
    }

    #[test]
    fn test_identity_merges_frames_from_different_paths() {
        let t = trace(
            vec![
                Frame::new("main", "/opt/a/libapp.so"),
                Frame::new("main", "/opt/b/libapp.so"),
            ],
            vec![vec![0], vec![1]],
            vec![Sample::new(0, 0), Sample::new(10, 1)],
        );

        let trees = build_call_trees(&t).unwrap();
        assert_eq!(trees[&0].len(), 1);
        assert_eq!(trees[&0][0].sample_count, 2);
        assert_eq!(trees[&0][0].package, "libapp.so");
    }

    #[test]
    fn test_empty_stack_is_skipped() {
        let t = trace(
            vec![frame("a")],
            vec![vec![], vec![0]],
            vec![Sample::new(0, 0), Sample::new(10, 1)],
        );

        let trees = build_call_trees(&t).unwrap();
        assert_eq!(trees[&0].len(), 1);
        assert_eq!(trees[&0][0].sample_count, 1);
    }

    #[test]
    fn test_no_samples_yields_empty_map() {
        let t = trace(vec![frame("a")], vec![vec![0]], vec![]);
        assert!(build_call_trees(&t).unwrap().is_empty());
    }

    #[test]
    fn test_stack_out_of_range() {
        let t = trace(
            vec![frame("a")],
            vec![vec![0]],
            vec![Sample::new(0, 0), Sample::new(10, 4)],
        );

        assert_eq!(
            build_call_trees(&t).unwrap_err(),
            MalformedTraceError::StackOutOfRange {
                sample: 1,
                stack_id: 4,
                stack_count: 1,
            }
        );
    }

    #[test]
    fn test_frame_out_of_range() {
        let t = trace(vec![frame("a")], vec![vec![0, 2]], vec![Sample::new(0, 0)]);

        assert_eq!(
            build_call_trees(&t).unwrap_err(),
            MalformedTraceError::FrameOutOfRange {
                stack_id: 0,
                frame_index: 2,
                frame_count: 1,
            }
        );
    }
}
