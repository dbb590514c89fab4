//! The open list.
use crate::node::Rank;
use crate::node::SearchNode;
use crate::space::Cost;
use crate::space::State;

const HEAP_ARITY: usize = 4usize;
#[inline(always)]
#[must_use]
fn up(i: usize) -> usize {
    crate::heap_primitives::index_parent::<HEAP_ARITY>(i)
}
#[inline(always)]
#[must_use]
fn children(i: usize, len: usize) -> std::ops::Range<usize> {
    crate::heap_primitives::index_children::<HEAP_ARITY>(i, len)
}

/// A min-heap of [`SearchNode`]s ordered by `(priority, sequence)`.
///
/// Sequence numbers are handed out by [`PriorityFrontier::push`], so among
/// nodes with equal priority the one pushed first is popped first. The state
/// value never takes part in the ordering.
///
/// Nodes are never updated or removed in place. A state may have several
/// entries at once and the caller is expected to skip the stale ones when
/// they come out.
#[derive(Debug, Clone)]
pub struct PriorityFrontier<St, C>
where
    St: State,
    C: Cost,
{
    open: Vec<SearchNode<St, C>>,
    next_sequence: u64,
    peak_len: usize,
}

impl<St, C> PriorityFrontier<St, C>
where
    St: State,
    C: Cost,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: Vec::with_capacity(256),
            next_sequence: 0,
            peak_len: 0,
        }
    }

    /// The sequence number the next pushed node gets.
    #[inline(always)]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Pushes a node, stamping it with the next sequence number.
    ///
    /// Returns the stamped node.
    pub fn push(&mut self, mut node: SearchNode<St, C>) -> SearchNode<St, C> {
        self.verify_heap();

        node.sequence = self.next_sequence;
        self.next_sequence += 1;

        let index = self.open.len();
        self.open.push(node);
        self.sift_up(index);
        self.peak_len = self.peak_len.max(self.open.len());

        self.verify_heap();
        node
    }

    /// Removes the node with the lowest `(priority, sequence)`.
    #[must_use]
    pub fn pop_min(&mut self) -> Option<SearchNode<St, C>> {
        let last = self.open.len().checked_sub(1)?;
        self.open.swap(0, last);
        let node = self.open.pop();
        if !self.open.is_empty() {
            self.sift_down(0);
        }

        self.verify_heap();
        node
    }

    /// All nodes, best first.
    #[must_use]
    pub fn peek_all(&self) -> Vec<SearchNode<St, C>> {
        let mut nodes = self.open.clone();
        nodes.sort_unstable_by_key(SearchNode::rank);
        nodes
    }

    #[inline(always)]
    pub fn peek_min(&self) -> Option<&SearchNode<St, C>> {
        self.open.first()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// The largest size this frontier ever had.
    #[inline(always)]
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    #[inline(always)]
    fn rank(&self, i: usize) -> Rank<C> {
        self.open[i].rank()
    }

    /// Raises a node
    /// Returns it's new index
    fn sift_up(&mut self, mut pos: usize) -> usize {
        debug_assert!(pos < self.open.len(), "Index out of bounds...");

        while pos > 0 {
            let parent = up(pos);
            if self.rank(parent) <= self.rank(pos) {
                break;
            }
            self.open.swap(parent, pos);
            pos = parent;
        }
        pos
    }

    /// Lowers a node
    /// Returns it's new index
    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.open.len();
        debug_assert!(pos < len, "Index out of bounds...");

        loop {
            // Find the best child
            let Some(child) = children(pos, len).min_by_key(|&c| self.rank(c)) else {
                break;
            };
            if self.rank(pos) <= self.rank(child) {
                break;
            }
            self.open.swap(pos, child);
            pos = child;
        }
        pos
    }

    #[inline(always)]
    #[cfg(not(feature = "verify"))]
    fn verify_heap(&self) {
        // All good... (hopefully)
    }
    #[inline(always)]
    #[cfg(feature = "verify")]
    fn verify_heap(&self) {
        // Every node goes after its parent node, if any.
        for i in 1..self.open.len() {
            let p = up(i);
            assert!(
                self.rank(p) <= self.rank(i),
                "Node[{p}]={:?} !<= child [{i}]={:?}. Out of heap of len={}",
                self.open[p],
                self.open[i],
                self.open.len(),
            );
        }
    }
}

impl<St, C> Default for PriorityFrontier<St, C>
where
    St: State,
    C: Cost,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mode;

    fn node(state: u8, g: u32, h: u32) -> SearchNode<u8, u32> {
        SearchNode::new(Mode::AStar, state, g, h, 0)
    }

    #[test]
    fn pops_lowest_priority_first() {
        let mut frontier = PriorityFrontier::new();
        frontier.push(node(1, 10, 0));
        frontier.push(node(2, 5, 0));
        frontier.push(node(3, 15, 0));

        let popped: Vec<u8> = std::iter::from_fn(|| frontier.pop_min())
            .map(|n| n.state)
            .collect();
        assert_eq!(popped, vec![2, 1, 3]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn ties_pop_in_insertion_order_not_state_order() {
        let mut frontier = PriorityFrontier::new();
        // Same priority, states pushed in descending value order.
        for state in [9u8, 4, 7, 1, 8, 2, 6] {
            frontier.push(node(state, 3, 4));
        }

        let popped: Vec<u8> = std::iter::from_fn(|| frontier.pop_min())
            .map(|n| n.state)
            .collect();
        assert_eq!(popped, vec![9, 4, 7, 1, 8, 2, 6]);
    }

    #[test]
    fn push_stamps_sequence_numbers() {
        let mut frontier = PriorityFrontier::new();
        let a = frontier.push(node(1, 1, 1));
        let b = frontier.push(node(1, 0, 1));
        assert_eq!(a.sequence, 0);
        assert_eq!(b.sequence, 1);
        assert_eq!(frontier.next_sequence(), 2);
    }

    #[test]
    fn duplicates_coexist() {
        let mut frontier = PriorityFrontier::new();
        frontier.push(node(5, 10, 1));
        frontier.push(node(5, 4, 1));
        assert_eq!(frontier.len(), 2);

        let best = frontier.pop_min().unwrap();
        assert_eq!((best.state, best.g), (5, 4));
        let stale = frontier.pop_min().unwrap();
        assert_eq!((stale.state, stale.g), (5, 10));
    }

    #[test]
    fn peek_all_is_sorted_and_non_destructive() {
        let mut frontier = PriorityFrontier::new();
        for (state, g) in [(1u8, 7u32), (2, 3), (3, 7), (4, 1), (5, 3)] {
            frontier.push(node(state, g, 0));
        }

        let snapshot: Vec<u8> = frontier.peek_all().iter().map(|n| n.state).collect();
        assert_eq!(snapshot, vec![4, 2, 5, 1, 3]);
        assert_eq!(frontier.len(), 5);
        assert_eq!(frontier.peek_min().map(|n| n.state), Some(4));
    }

    #[test]
    fn matches_a_sorted_reference() {
        use rand::Rng;
        use rand_chacha::ChaCha8Rng;
        use rand_chacha::rand_core::SeedableRng;

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut frontier = PriorityFrontier::new();
        let mut reference = vec![];
        for i in 0..500u32 {
            let pushed = frontier.push(node((i % 251) as u8, rng.random_range(0..20), 0));
            reference.push(pushed.rank());
            if i % 3 == 0 {
                reference.sort();
                let expected = reference.remove(0);
                assert_eq!(frontier.pop_min().map(|n| n.rank()), Some(expected));
            }
        }
        reference.sort();
        for expected in reference {
            assert_eq!(frontier.pop_min().map(|n| n.rank()), Some(expected));
        }
        assert!(frontier.pop_min().is_none());
        assert!(frontier.peak_len() > 0);
    }
}
