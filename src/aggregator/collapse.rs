//! Collapse call trees into a simpler shape for display and analysis.
//!
//! Collapsing removes nodes that carry no diagnostic value without
//! changing the time attributed to the frames that survive:
//!
//! 1. unnamed (unsymbolicated) nodes are dropped, their children promoted
//! 2. nodes observed on a single sample are dropped, their children promoted
//! 3. a node whose only child spans exactly the same duration is fused with
//!    it: an application frame wins over a system child, otherwise the
//!    deeper frame is kept
//!
//! Children are collapsed before their parent is evaluated. The input is
//! never modified; every function here returns a new forest.

use crate::model::{CallTrees, Node};
use log::debug;

impl Node {
    /// Collapse this node, returning the nodes that replace it
    ///
    /// The result may be empty (the whole subtree was noise), the node
    /// itself, or a list of promoted descendants.
    pub fn collapse(&self) -> Vec<Node> {
        collapse_node(self.clone())
    }
}

/// Collapse every root of a forest and concatenate the replacements
pub fn collapse_forest(forest: &[Node]) -> Vec<Node> {
    forest.iter().cloned().flat_map(collapse_node).collect()
}

/// Collapse the forest of every execution context
///
/// Contexts whose forest collapses to nothing are kept with an empty forest.
pub fn collapse_call_trees(call_trees: &CallTrees) -> CallTrees {
    call_trees
        .iter()
        .map(|(&thread_id, forest)| {
            let collapsed = collapse_forest(forest);
            debug!(
                "Thread {}: collapsed {} roots into {}",
                thread_id,
                forest.len(),
                collapsed.len()
            );
            (thread_id, collapsed)
        })
        .collect()
}

fn collapse_node(mut node: Node) -> Vec<Node> {
    let children: Vec<Node> = std::mem::take(&mut node.children)
        .into_iter()
        .flat_map(collapse_node)
        .collect();

    if node.is_unnamed() || node.sample_count == 1 {
        return children;
    }

    node.children = children;

    // Keeping the parent adopts the child's children, which may expose
    // another fusable pass-through below it.
    loop {
        if node.children.len() != 1 || node.children[0].duration_ns != node.duration_ns {
            return vec![node];
        }

        let Some(child) = node.children.pop() else {
            return vec![node];
        };

        if node.is_application && !child.is_application {
            node.children = child.children;
            continue;
        }

        return vec![child];
    }
}
