//! Recombining trinomial tree arena.
//!
//! All nodes live in one contiguous vector. Level `m` occupies the slice
//! starting at `level_start[m]`, with offsets running from `+j_max` down to
//! `-j_max`, so the flat index of `(m, j)` is
//! `level_start[m] + (j_max(m) - j)`. Child links are flat indices into the
//! same vector.

use crate::error::{LatticeError, LatticeResult};
use crate::node::{Branch, Children, LatticeNode, Scratch};
use crate::traversal::{NodeView, NodeVisitor};

/// Recombining trinomial tree owning every node.
///
/// # Example
///
/// ```rust
/// use ratetree_lattice::RecombinantTree;
///
/// let mut tree = RecombinantTree::new();
/// tree.add_level(2).unwrap();
/// tree.add_level(2).unwrap();
/// tree.add_level(2).unwrap();
///
/// // Width saturates at the bound
/// assert_eq!(tree.j_max(1).unwrap(), 1);
/// assert_eq!(tree.j_max(2).unwrap(), 2);
/// assert_eq!(tree.j_max(3).unwrap(), 2);
/// assert_eq!(tree.level_len(3).unwrap(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct RecombinantTree {
    nodes: Vec<LatticeNode>,
    level_start: Vec<usize>,
    level_j_max: Vec<i32>,
}

impl Default for RecombinantTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RecombinantTree {
    /// Creates a tree holding only the root `(0, 0)`.
    pub fn new() -> Self {
        Self {
            nodes: vec![LatticeNode::new(0, 0)],
            level_start: vec![0],
            level_j_max: vec![0],
        }
    }

    /// Appends one level and links the current last level to it.
    ///
    /// Nodes of the current last level are classified against `bound`
    /// ([`Branch::classify`]); the new level is one state wider on each side
    /// while the last level is narrower than `bound`, and the same width
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `bound < 1`.
    pub fn add_level(&mut self, bound: i32) -> LatticeResult<()> {
        if bound < 1 {
            return Err(LatticeError::invalid_parameter(format!(
                "saturation bound must be at least 1, got {bound}"
            )));
        }

        let last = self.last_step();
        let last_range = self.level_range(last);
        let j_last = self.level_j_max[last];
        let j_next = if bound > j_last { j_last + 1 } else { j_last };
        let next_start = self.nodes.len();
        let next = last + 1;

        let width = (2 * j_next + 1) as usize;
        self.nodes.reserve(width);
        for offset in (-j_next..=j_next).rev() {
            self.nodes.push(LatticeNode::new(next, offset));
        }

        let index_in_next = |offset: i32| next_start + (j_next - offset) as usize;
        for index in last_range {
            let node = &mut self.nodes[index];
            node.branch = Branch::classify(node.offset, bound);
            node.children = node
                .branch
                .child_offsets(node.offset)
                .map(|(up, mid, down)| Children {
                    up: index_in_next(up),
                    mid: index_in_next(mid),
                    down: index_in_next(down),
                });
        }

        self.level_start.push(next_start);
        self.level_j_max.push(j_next);
        Ok(())
    }

    /// Number of levels, i.e. last time step plus one.
    pub fn num_levels(&self) -> usize {
        self.level_start.len()
    }

    /// Last time step.
    pub fn last_step(&self) -> usize {
        self.level_start.len() - 1
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Width bound of a level.
    pub fn j_max(&self, time_step: usize) -> LatticeResult<i32> {
        self.check_step(time_step)?;
        Ok(self.level_j_max[time_step])
    }

    /// Number of nodes on a level, `2·j_max + 1`.
    pub fn level_len(&self, time_step: usize) -> LatticeResult<usize> {
        Ok((2 * self.j_max(time_step)? + 1) as usize)
    }

    /// Flat arena index of `(time_step, offset)`.
    pub fn index_of(&self, time_step: usize, offset: i32) -> LatticeResult<usize> {
        let j_max = self.j_max(time_step)?;
        if offset.abs() > j_max {
            return Err(LatticeError::IndexOutOfRange {
                time_step,
                offset,
                j_max,
            });
        }
        Ok(self.level_start[time_step] + (j_max - offset) as usize)
    }

    /// Node at `(time_step, offset)`.
    ///
    /// # Errors
    ///
    /// `TimeStepOutOfRange` past the last level, `IndexOutOfRange` when
    /// `|offset|` exceeds the level's width.
    pub fn node(&self, time_step: usize, offset: i32) -> LatticeResult<&LatticeNode> {
        let index = self.index_of(time_step, offset)?;
        Ok(&self.nodes[index])
    }

    pub(crate) fn node_mut(&mut self, time_step: usize, offset: i32) -> LatticeResult<&mut LatticeNode> {
        let index = self.index_of(time_step, offset)?;
        Ok(&mut self.nodes[index])
    }

    /// Node at a flat arena index, as stored in [`Children`].
    pub fn get(&self, index: usize) -> Option<&LatticeNode> {
        self.nodes.get(index)
    }

    /// Nodes of one level, from `+j_max` down to `-j_max`.
    pub fn level(&self, time_step: usize) -> LatticeResult<&[LatticeNode]> {
        self.check_step(time_step)?;
        Ok(&self.nodes[self.level_range(time_step)])
    }

    pub(crate) fn level_mut(&mut self, time_step: usize) -> LatticeResult<&mut [LatticeNode]> {
        self.check_step(time_step)?;
        let range = self.level_range(time_step);
        Ok(&mut self.nodes[range])
    }

    /// Adds `p·amount(node)` to each child's Arrow-Debreu price for every
    /// node of a level.
    pub(crate) fn push_forward<F>(&mut self, time_step: usize, amount: F) -> LatticeResult<()>
    where
        F: Fn(&LatticeNode) -> f64,
    {
        self.check_step(time_step)?;
        for index in self.level_range(time_step) {
            let node = &self.nodes[index];
            let Some(children) = node.children else {
                continue;
            };
            let p = node.probabilities;
            let weight = amount(node);
            self.nodes[children.up].arrow_debreu += p.up * weight;
            self.nodes[children.mid].arrow_debreu += p.mid * weight;
            self.nodes[children.down].arrow_debreu += p.down * weight;
        }
        Ok(())
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    /// Zeroes every node's scratch record.
    pub fn reset_scratch(&mut self) {
        for node in &mut self.nodes {
            node.scratch = Scratch::default();
        }
    }

    /// Applies `visitor` to every node of one level.
    pub fn traverse_level<V: NodeVisitor + ?Sized>(
        &mut self,
        time_step: usize,
        visitor: &mut V,
    ) -> LatticeResult<()> {
        self.check_step(time_step)?;
        for index in self.level_range(time_step) {
            let scratch = visitor.process_node(NodeView::new(self, index));
            self.nodes[index].scratch = scratch;
        }
        Ok(())
    }

    /// Applies `visitor` to every node in arena order (root level first).
    pub fn traverse_all<V: NodeVisitor + ?Sized>(&mut self, visitor: &mut V) {
        for index in 0..self.nodes.len() {
            let scratch = visitor.process_node(NodeView::new(self, index));
            self.nodes[index].scratch = scratch;
        }
    }

    fn level_range(&self, time_step: usize) -> std::ops::Range<usize> {
        let start = self.level_start[time_step];
        let end = self
            .level_start
            .get(time_step + 1)
            .copied()
            .unwrap_or(self.nodes.len());
        start..end
    }

    fn check_step(&self, time_step: usize) -> LatticeResult<()> {
        if time_step >= self.level_start.len() {
            return Err(LatticeError::TimeStepOutOfRange {
                time_step,
                last_step: self.last_step(),
            });
        }
        Ok(())
    }
}
