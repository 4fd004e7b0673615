//! Visitor protocol for walking a lattice.
//!
//! A visitor sees one node at a time through a [`NodeView`] and returns the
//! node's new [`Scratch`] record; the tree stores it. Pricing visitors run
//! levels in decreasing time-step order so that children's scratch values
//! are final before their parents read them.

use crate::node::{LatticeNode, Scratch};
use crate::tree::RecombinantTree;

/// Per-node callback driven by the tree's traversal methods.
///
/// Any `FnMut(NodeView<'_>) -> Scratch` closure is a visitor.
pub trait NodeVisitor {
    /// Computes the scratch record for the visited node.
    fn process_node(&mut self, view: NodeView<'_>) -> Scratch;
}

impl<F> NodeVisitor for F
where
    F: FnMut(NodeView<'_>) -> Scratch,
{
    fn process_node(&mut self, view: NodeView<'_>) -> Scratch {
        self(view)
    }
}

/// Read-only window onto the node being visited.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a RecombinantTree,
    index: usize,
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(tree: &'a RecombinantTree, index: usize) -> Self {
        Self { tree, index }
    }

    /// The visited node.
    pub fn node(&self) -> &'a LatticeNode {
        &self.tree.nodes()[self.index]
    }

    /// Time step of the visited node.
    pub fn time_step(&self) -> usize {
        self.node().time_step
    }

    /// State offset of the visited node.
    pub fn offset(&self) -> i32 {
        self.node().offset
    }

    /// Realized short rate at the visited node.
    pub fn rate(&self) -> f64 {
        self.node().rate
    }

    /// The whole tree, for look-ups such as rates on earlier levels.
    pub fn tree(&self) -> &'a RecombinantTree {
        self.tree
    }

    /// `(probability, child)` pairs in up, mid, down order, or `None` on the
    /// last level.
    pub fn children(&self) -> Option<[(f64, &'a LatticeNode); 3]> {
        let node = self.node();
        let links = node.children?;
        let nodes = self.tree.nodes();
        let p = node.probabilities;
        Some([
            (p.up, &nodes[links.up]),
            (p.mid, &nodes[links.mid]),
            (p.down, &nodes[links.down]),
        ])
    }

    /// Probability-weighted sum of a scratch field over the children.
    ///
    /// Zero on the last level.
    pub fn expected<F>(&self, field: F) -> f64
    where
        F: Fn(&Scratch) -> f64,
    {
        self.children().map_or(0.0, |children| {
            children
                .iter()
                .map(|(p, child)| p * field(&child.scratch))
                .sum()
        })
    }
}
