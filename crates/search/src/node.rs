use ordered_float::OrderedFloat;
use puzzle::PuzzleState;

/// A node in the search tree.
///
/// Nodes are stored in a flat arena (`Vec<SearchNode>`) and reference
/// parents by index. Each node owns the immutable puzzle state reached by
/// applying one critiqued thought to the parent state.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Puzzle state at this node (history holds the path from the root).
    pub state: PuzzleState,
    /// Index of the parent node in the arena, `None` for root.
    pub parent: Option<usize>,
    /// Number of thoughts applied from root.
    pub depth: u32,
    /// Critique score of the thought that produced this node (1.0 for root).
    pub step_score: f64,
    /// Minimum step score along the path from root.
    pub path_score: f64,
}

impl SearchNode {
    /// Root node. No steps have been taken, so nothing drags the path score down.
    pub fn root(state: PuzzleState) -> Self {
        Self {
            depth: state.depth(),
            state,
            parent: None,
            step_score: 1.0,
            path_score: 1.0,
        }
    }

    /// Child of `parent` (stored at `parent_index`) with the given step score.
    pub fn child(parent: &SearchNode, parent_index: usize, state: PuzzleState, step_score: f64) -> Self {
        Self {
            depth: parent.depth + 1,
            state,
            parent: Some(parent_index),
            step_score,
            path_score: parent.path_score.min(step_score),
        }
    }

    /// Description of the thought that produced this node (`None` for root).
    pub fn thought(&self) -> Option<&str> {
        self.parent
            .and(self.state.history().last())
            .map(|t| t.description.as_str())
    }
}

/// A frontier entry ranked for `BinaryHeap` (max-heap).
///
/// Higher path score pops first; ties go to the shallower node, then to the
/// node inserted earlier (lower arena index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredNode {
    /// Index into the `Vec<SearchNode>` arena.
    pub node_index: usize,
    /// Path score for priority ordering.
    pub score: OrderedFloat<f64>,
    /// Depth of the node, for tie-breaking.
    pub depth: u32,
}

impl ScoredNode {
    pub fn new(node_index: usize, node: &SearchNode) -> Self {
        Self {
            node_index,
            score: OrderedFloat(node.path_score),
            depth: node.depth,
        }
    }
}

impl PartialOrd for ScoredNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| other.node_index.cmp(&self.node_index))
    }
}
