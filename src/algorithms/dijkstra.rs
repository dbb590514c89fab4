//! A plain Dijkstra used as a reference for optimal costs.
//!
//! Nothing fancy here: a binary heap with lazy deletion and a parent map. It
//! keeps no trace and breaks ties however [`BinaryHeap`] likes, which is fine
//! since only costs get compared against it.
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::marker::PhantomData;

use rustc_hash::FxHashMap;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

#[derive(Debug)]
pub struct DijkstraSearch<'a, Sp, St, A, C>
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    space: &'a Sp,

    _phantom_state: PhantomData<St>,
    _phantom_action: PhantomData<A>,
    _phantom_cost: PhantomData<C>,
}

impl<'a, Sp, St, A, C> DijkstraSearch<'a, Sp, St, A, C>
where
    Sp: Space<St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(space: &'a Sp) -> Self {
        Self {
            space,
            _phantom_state: PhantomData,
            _phantom_action: PhantomData,
            _phantom_cost: PhantomData,
        }
    }

    /// Settles states by increasing cost from `start`, stopping early once
    /// `goal` is settled.
    ///
    /// Returns the best costs and the parent of every reached state.
    fn settle(&self, start: St, goal: Option<St>) -> (FxHashMap<St, C>, FxHashMap<St, (St, A, C)>) {
        let mut best = FxHashMap::<St, C>::default();
        let mut parents = FxHashMap::<St, (St, A, C)>::default();
        let mut open = BinaryHeap::new();

        best.insert(start, C::zero());
        open.push(Reverse((C::zero(), start)));

        while let Some(Reverse((g, s))) = open.pop() {
            if best.get(&s).is_some_and(|&b| g > b) {
                continue;
            }
            if Some(s) == goal {
                break;
            }

            for succ in self.space.successors(&s) {
                let new_g = g.saturating_add(&succ.cost);
                if best.get(&succ.state).is_none_or(|&b| new_g < b) {
                    best.insert(succ.state, new_g);
                    parents.insert(succ.state, (s, succ.action, succ.cost));
                    open.push(Reverse((new_g, succ.state)));
                }
            }
        }

        (best, parents)
    }

    /// The optimal cost of every state reachable from `start`.
    pub fn distances_from(&self, start: St) -> FxHashMap<St, C> {
        self.settle(start, None).0
    }

    /// The optimal cost from `start` to `goal`, if it's reachable.
    pub fn distance(&self, start: St, goal: St) -> Option<C> {
        self.settle(start, Some(goal)).0.get(&goal).copied()
    }

    /// An optimal path from `start` to `goal`, if it's reachable.
    pub fn find_path(&self, start: St, goal: St) -> Option<Path<St, A, C>> {
        let (best, parents) = self.settle(start, Some(goal));
        if !best.contains_key(&goal) {
            return None;
        }

        let mut path = Path::<St, A, C>::new_from_start(goal);
        let mut s = goal;
        while let Some(&(parent, action, cost)) = parents.get(&s) {
            path.append((parent, action), cost);
            debug_assert!(s != parent);
            s = parent;
        }
        path.reverse();
        Some(path)
    }
}
