//! Per-node lattice record.

use serde::{Deserialize, Serialize};

/// Branching pattern of a node, fixed by its offset and the saturation bound.
///
/// ```text
///   Mid           Up            Down
///      / j+1         / j+2      ── j
///   j ── j         j ── j+1   j ── j-1
///      \ j-1         \ j          \ j-2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Branch {
    /// Offset at the negative bound: children `j+2, j+1, j`.
    Up,
    /// Offset at the positive bound: children `j, j-1, j-2`.
    Down,
    /// Interior offset: children `j+1, j, j-1`.
    Mid,
    /// Not yet linked (nodes on the last level).
    #[default]
    Undefined,
}

impl Branch {
    /// Classifies an offset against the saturation bound.
    pub fn classify(offset: i32, bound: i32) -> Self {
        if offset >= bound {
            Self::Down
        } else if offset <= -bound {
            Self::Up
        } else {
            Self::Mid
        }
    }

    /// Offsets of the `(up, mid, down)` children, or `None` if undefined.
    pub fn child_offsets(self, offset: i32) -> Option<(i32, i32, i32)> {
        match self {
            Self::Mid => Some((offset + 1, offset, offset - 1)),
            Self::Up => Some((offset + 2, offset + 1, offset)),
            Self::Down => Some((offset, offset - 1, offset - 2)),
            Self::Undefined => None,
        }
    }

    /// Short label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Mid => "mid",
            Self::Undefined => "-",
        }
    }
}

/// Flat arena indices of a node's three children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Children {
    /// Highest child.
    pub up: usize,
    /// Middle child.
    pub mid: usize,
    /// Lowest child.
    pub down: usize,
}

/// Transition probabilities to the `(up, mid, down)` children.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Probabilities {
    /// Probability of moving to the up child.
    pub up: f64,
    /// Probability of moving to the middle child.
    pub mid: f64,
    /// Probability of moving to the down child.
    pub down: f64,
}

impl Probabilities {
    /// Standard trinomial probabilities for a branch type.
    ///
    /// `x` is `a·j·dt`, the mean-reversion pull at offset `j`. The three
    /// quadratics match the first two moments of the discretized process
    /// for each branching pattern.
    pub fn trinomial(branch: Branch, x: f64) -> Self {
        let x2 = x * x;
        match branch {
            Branch::Mid => Self {
                up: 1.0 / 6.0 + (x2 - x) / 2.0,
                mid: 2.0 / 3.0 - x2,
                down: 1.0 / 6.0 + (x2 + x) / 2.0,
            },
            Branch::Up => Self {
                up: 1.0 / 6.0 + (x2 + x) / 2.0,
                mid: -1.0 / 3.0 - x2 - 2.0 * x,
                down: 7.0 / 6.0 + (x2 + 3.0 * x) / 2.0,
            },
            Branch::Down => Self {
                up: 7.0 / 6.0 + (x2 - 3.0 * x) / 2.0,
                mid: -1.0 / 3.0 - x2 + 2.0 * x,
                down: 1.0 / 6.0 + (x2 - x) / 2.0,
            },
            Branch::Undefined => Self::default(),
        }
    }

    /// Sum of the three probabilities.
    pub fn total(&self) -> f64 {
        self.up + self.mid + self.down
    }
}

/// Working values written by a traversal visitor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scratch {
    /// Primary accumulator.
    pub value1: f64,
    /// Secondary accumulator.
    pub value2: f64,
    /// Tertiary accumulator.
    pub value3: f64,
    /// Free marker, e.g. an exercised call.
    pub flag: bool,
}

impl Scratch {
    /// Scratch holding a single value.
    pub fn value(value1: f64) -> Self {
        Self {
            value1,
            ..Self::default()
        }
    }
}

/// One node of a recombining trinomial lattice.
///
/// Nodes never own each other: `children` holds arena indices resolved when
/// the next level is added.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeNode {
    /// Time step (level) of the node.
    pub time_step: usize,
    /// State offset `j` within the level.
    pub offset: i32,
    /// Branching pattern.
    pub branch: Branch,
    /// Child links, set once the next level exists.
    pub children: Option<Children>,
    /// Transition probabilities to the children.
    pub probabilities: Probabilities,
    /// Arrow-Debreu price.
    pub arrow_debreu: f64,
    /// Realized short rate.
    pub rate: f64,
    /// Traversal accumulators.
    pub scratch: Scratch,
}

impl LatticeNode {
    pub(crate) fn new(time_step: usize, offset: i32) -> Self {
        Self {
            time_step,
            offset,
            branch: Branch::Undefined,
            children: None,
            probabilities: Probabilities::default(),
            arrow_debreu: 0.0,
            rate: 0.0,
            scratch: Scratch::default(),
        }
    }
}
