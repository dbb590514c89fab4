//! Frontier entries and their ranking.
use derive_more::Display;

use crate::space::Cost;
use crate::space::State;

/// Which value orders the frontier.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Mode {
    /// `f = g + h`
    #[display("A*")]
    AStar,
    /// `h` alone. `g` is still tracked, but only for display.
    #[display("GBFS")]
    GreedyBestFirst,
}

impl Mode {
    /// The priority key of a node reached with cost `g` and estimate `h`.
    #[inline(always)]
    #[must_use]
    pub fn priority<C: Cost>(&self, g: C, h: C) -> C {
        match self {
            Mode::AStar => g.saturating_add(&h),
            Mode::GreedyBestFirst => h,
        }
    }

    /// The name of the priority key, `f` or `h`.
    pub fn key_name(&self) -> &'static str {
        match self {
            Mode::AStar => "f",
            Mode::GreedyBestFirst => "h",
        }
    }
}

/// The ranking tuple for the frontier
///
/// We prefer lower priorities, and tie break for the earliest insertion.
///
/// ```
/// use informed_search::node::Rank;
///
/// assert!(Rank::new(3u32, 9) < Rank::new(4u32, 0));
/// assert!(Rank::new(3u32, 0) < Rank::new(3u32, 1));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rank<C: Cost> {
    pub priority: C,
    pub sequence: u64,
}

impl<C: Cost> Rank<C> {
    pub fn new(priority: C, sequence: u64) -> Self {
        Self { priority, sequence }
    }
}

/// A frontier entry.
///
/// Nodes are values: a state reached through a better path gets a new node,
/// and the old one goes stale in the frontier until it's popped and skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchNode<St, C>
where
    St: State,
    C: Cost,
{
    pub state: St,
    pub g: C,
    pub h: C,
    /// `g + h` for A*, `h` for GBFS.
    pub priority: C,
    /// Insertion order into the frontier.
    pub sequence: u64,
}

impl<St, C> SearchNode<St, C>
where
    St: State,
    C: Cost,
{
    #[must_use]
    pub fn new(mode: Mode, state: St, g: C, h: C, sequence: u64) -> Self {
        Self {
            state,
            g,
            h,
            priority: mode.priority(g, h),
            sequence,
        }
    }

    #[inline(always)]
    pub fn rank(&self) -> Rank<C> {
        Rank::new(self.priority, self.sequence)
    }

    /// `g + h`, regardless of the mode used to rank this node.
    #[inline(always)]
    pub fn f(&self) -> C {
        self.g.saturating_add(&self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_by_mode() {
        let g = 140u32;
        let h = 253u32;
        assert_eq!(Mode::AStar.priority(g, h), 393);
        assert_eq!(Mode::GreedyBestFirst.priority(g, h), 253);
    }

    #[test]
    fn ranking() {
        // Lower priority always wins
        assert!(Rank::new(1u32, 10) < Rank::new(2u32, 0));
        // Same priority, needs tie-breaking on insertion
        let first = Rank::new(5u32, 3);
        let second = Rank::new(5u32, 4);
        assert!(first < second);
        assert!(first.priority == second.priority);
    }

    #[test]
    fn node_keeps_g_in_greedy_mode() {
        let node = SearchNode::new(Mode::GreedyBestFirst, 7u8, 30u32, 4u32, 0);
        assert_eq!(node.priority, 4);
        assert_eq!(node.g, 30);
        assert_eq!(node.f(), 34);
    }
}
