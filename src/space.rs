use std::fmt::Debug;
use std::hash::Hash;

use smallvec::SmallVec;

pub use crate::cost::Cost;

/// A transition label, identifying which tile or road was used.
pub trait Action: Copy + Clone + Debug + PartialEq + Eq {}

/// A configuration in a search space.
///
/// States are stored by value in the frontier, the cost and parent maps and
/// every trace snapshot, so they must be cheap to copy. The total order is
/// only there to make states usable as deterministic keys; the frontier never
/// breaks ties on it.
pub trait State: Copy + Clone + Debug + PartialEq + Eq + Hash + PartialOrd + Ord {}

/// A transition out of a state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Successor<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub state: St,
    pub action: A,
    pub cost: C,
}

/// Successors of a single state.
///
/// Both bundled domains branch at most 4 ways, which stays inline.
pub type Successors<St, A, C> = SmallVec<[Successor<St, A, C>; 4]>;

pub trait Space<St, A, C>: Debug
where
    St: State,
    A: Action,
    C: Cost,
{
    fn apply(&self, s: &St, a: &A) -> Option<St>;

    fn cost(&self, _s: &St, _a: &A) -> C {
        C::one()
    }

    /// Expands a State
    ///
    /// The order is part of the contract: it's the order in which successors
    /// are pushed, and therefore decides ties in the frontier.
    fn neighbours(&self, s: &St) -> Vec<(St, A)>;

    /// Expands a State with its step costs
    fn successors(&self, s: &St) -> Successors<St, A, C> {
        self.neighbours(s)
            .into_iter()
            .map(|(state, action)| Successor {
                state,
                action,
                cost: self.cost(s, &action),
            })
            .collect()
    }

    /// Verify is a State is valid.
    fn valid(&self, s: &St) -> bool;

    fn valid_path(&self, p: &Path<St, A, C>) -> bool {
        let Some(&start) = p.states.first() else {
            // Empty paths are fine
            return p.actions.is_empty() && p.cost == C::zero();
        };
        if p.states.len() != p.actions.len() + 1 || !self.valid(&start) {
            return false;
        }

        let mut cost = C::zero();
        for (window, a) in p.states.windows(2).zip(&p.actions) {
            let (from, to) = (window[0], window[1]);
            if self.apply(&from, a) != Some(to) {
                return false;
            }
            cost = cost.saturating_add(&self.cost(&from, a));
        }
        cost == p.cost
    }
}

/// An estimate of the remaining cost between two states.
pub trait Heuristic<Sp, St, A, C>: Debug
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    /// Must be `0` when `s == goal`.
    fn h(&self, space: &Sp, s: &St, goal: &St) -> C;
}

/// The uninformed estimate. A* with it is uniform-cost search.
#[derive(Copy, Clone, Debug, Default)]
pub struct ZeroHeuristic;

impl<Sp, St, A, C> Heuristic<Sp, St, A, C> for ZeroHeuristic
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn h(&self, _space: &Sp, _s: &St, _goal: &St) -> C {
        C::zero()
    }
}

/// A sequence of states joined by actions.
///
/// An empty path (no states) means there's no solution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub states: Vec<St>,
    pub actions: Vec<A>,
    pub cost: C,
}

impl<St, A, C> Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn new_from_start(start: St) -> Self {
        Self {
            states: vec![start],
            actions: vec![],
            cost: C::zero(),
        }
    }

    #[inline(always)]
    pub fn empty() -> Self {
        Self {
            states: vec![],
            actions: vec![],
            cost: C::zero(),
        }
    }

    /// Whether this is the "no solution" path.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of actions.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn start(&self) -> Option<&St> {
        self.states.first()
    }

    pub fn end(&self) -> Option<&St> {
        self.states.last()
    }

    #[inline(always)]
    pub fn append(&mut self, last_action: (St, A), c: C) {
        let (s, a) = last_action;
        self.actions.push(a);
        self.states.push(s);
        self.cost = self.cost.saturating_add(&c);
    }

    /// Reverses the Path.
    ///
    /// Useful when naturally reconstructing paths in reverse, where actions
    /// were appended next to the state they lead *to*.
    pub fn reverse(&mut self) {
        self.states.reverse();
        self.actions.reverse();
    }
}

impl<St, A, C> std::fmt::Display for Path<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => {
                write!(
                    f,
                    "Path({}, {:?}:{:?}:{:?})",
                    self.cost,
                    start,
                    self.actions.iter().take(20).collect::<Vec<_>>(),
                    end
                )
            }
            _ => write!(f, "Path()"),
        }
    }
}
