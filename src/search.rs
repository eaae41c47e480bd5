use nonmax::NonMaxUsize;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::cost::Cost;
use crate::grid::Cell;
use crate::grid::GridError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("Invalid endpoint: {0}")]
    OutOfBounds(#[from] GridError),
    #[error("No path exists (expanded {expanded} nodes)")]
    NoPathExists { expanded: usize },
    #[error("Heuristic returned {value} for {cell}")]
    InvalidHeuristic { cell: Cell, value: f64 },
    #[error("Budget exhausted after expanding {expanded} nodes")]
    BudgetExhausted { expanded: usize },
}

impl SearchError {
    /// Whether the search ran to completion and proved there's no path.
    pub fn is_no_path(&self) -> bool {
        matches!(self, SearchError::NoPathExists { .. })
    }
}

/// A reference to a `SearchNode` in its `SearchTree`.
///
/// The order of indices is the order in which nodes were discovered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(NonMaxUsize);

impl NodeIndex {
    #[inline(always)]
    pub(crate) fn from_usize(i: usize) -> Self {
        match NonMaxUsize::new(i) {
            Some(i) => Self(i),
            None => unreachable!("Arena indices are bounded by isize::MAX"),
        }
    }
    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.0.get()
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "inspect", derive(Clone))]
pub struct SearchNode {
    pub(crate) cell: Cell,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) g: Cost,
    pub(crate) h: Cost,
    pub(crate) closed: bool,
}

impl SearchNode {
    pub fn new(cell: Cell, parent: Option<NodeIndex>, g: Cost, h: Cost) -> Self {
        Self {
            cell,
            parent,
            g,
            h,
            closed: false,
        }
    }

    /// Gives this Node a better path through a new parent.
    pub fn reach(&mut self, new_parent: NodeIndex, g: Cost) {
        debug_assert!(g < self.g);
        debug_assert!(!self.closed, "Closed nodes are final");
        self.parent = Some(new_parent);
        self.g = g;
    }

    #[inline(always)]
    pub fn cell(&self) -> Cell {
        self.cell
    }
    #[inline(always)]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }
    #[inline(always)]
    pub fn g(&self) -> Cost {
        self.g
    }
    #[inline(always)]
    pub fn h(&self) -> Cost {
        self.h
    }
    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// All the nodes of a search.
///
/// Nodes form a forest through their parent links. Nodes are never removed,
/// so a `NodeIndex` stays valid for the whole search.
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    /// Finds existing Search Nodes from their `Cell`.
    node_map: FxHashMap<Cell, NodeIndex>,
}

impl SearchTree {
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![],
            node_map: FxHashMap::default(),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, node: SearchNode) -> NodeIndex {
        debug_assert!(
            !self.node_map.contains_key(&node.cell),
            "{} already has a node",
            node.cell
        );
        let index = NodeIndex::from_usize(self.nodes.len());
        self.node_map.insert(node.cell, index);
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    pub fn get(&self, cell: &Cell) -> Option<NodeIndex> {
        self.node_map.get(cell).copied()
    }

    #[inline(always)]
    pub fn close(&mut self, index: NodeIndex) {
        debug_assert!(!self[index].closed);
        self[index].closed = true;
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The index table capacity, for memory stats.
    pub(crate) fn map_capacity(&self) -> usize {
        self.node_map.capacity()
    }

    /// The cells from the root of `index`'s tree down to `index`.
    #[must_use]
    pub fn path(&self, mut index: NodeIndex) -> Vec<Cell> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("PathReconstruction");

        let mut path = vec![self[index].cell];
        while let Some(parent) = self[index].parent {
            debug_assert!(parent != index);
            path.push(self[parent].cell);
            index = parent;
        }
        path.reverse();
        path
    }
}

impl Default for SearchTree {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<NodeIndex> for SearchTree {
    type Output = SearchNode;

    #[inline(always)]
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.as_usize()]
    }
}

impl std::ops::IndexMut<NodeIndex> for SearchTree {
    #[inline(always)]
    fn index_mut(&mut self, index: NodeIndex) -> &mut SearchNode {
        &mut self.nodes[index.as_usize()]
    }
}

impl std::fmt::Debug for SearchTree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use num_traits::Zero;

    use super::*;
    use crate::cost::move_cost;

    #[test]
    fn path_follows_parents() {
        let mut tree = SearchTree::new();
        let a = Cell::new(0, 0);
        let b = Cell::new(3, 1);
        let c = Cell::new(4, 4);

        let ia = tree.push(SearchNode::new(a, None, Cost::zero(), Cost::zero()));
        let ib = tree.push(SearchNode::new(b, Some(ia), move_cost(a, b), Cost::zero()));
        let ic = tree.push(SearchNode::new(c, Some(ia), move_cost(a, c), Cost::zero()));
        assert!(ia < ib && ib < ic);

        assert_eq!(tree.path(ia), vec![a]);
        assert_eq!(tree.path(ic), vec![a, c]);

        let g = move_cost(a, b) + move_cost(b, c);
        assert!(g > tree[ic].g());
        tree[ib].reach(ia, Cost::zero());
        assert_eq!(tree.get(&c), Some(ic));
        assert_eq!(tree.get(&Cell::new(9, 9)), None);

        tree.close(ia);
        assert!(tree[ia].is_closed());
        assert!(!tree[ic].is_closed());
    }

    #[test]
    fn errors_tell_no_path_apart() {
        assert!(SearchError::NoPathExists { expanded: 3 }.is_no_path());
        assert!(!SearchError::BudgetExhausted { expanded: 3 }.is_no_path());
        let e: SearchError = GridError::OutOfBounds {
            x: -1,
            y: 0,
            width: 2,
            height: 2,
        }
        .into();
        assert!(!e.is_no_path());
        assert_eq!(
            e.to_string(),
            "Invalid endpoint: (-1,0) is out of bounds of the 2x2 grid"
        );
    }
}
