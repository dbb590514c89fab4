//! Recorded expansions and a cursor to replay them.
use derive_more::Display;

use crate::node::Mode;
use crate::node::SearchNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::State;

/// How much of a run gets recorded.
#[derive(Copy, Clone, Debug, Default, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TraceLevel {
    /// Nothing, only the final path.
    #[display("none")]
    None,
    /// Every expanded node with its path, but no frontier snapshots.
    #[display("expansions")]
    Expansions,
    /// Everything, including a sorted copy of the frontier at every step.
    #[default]
    #[display("full")]
    Full,
}

/// One expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TraceStep<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// Position in the trace.
    pub index: usize,
    /// The node popped and expanded.
    pub node: SearchNode<St, C>,
    /// The frontier right after popping `node`, best first.
    ///
    /// `None` unless the trace level is [`TraceLevel::Full`].
    pub frontier: Option<Vec<SearchNode<St, C>>>,
    /// How many states were expanded, this one included.
    ///
    /// The expanded set only grows, so it's stored once in the [`Trace`] and
    /// each step keeps the length of its prefix. See [`Trace::expanded`].
    pub expanded_len: usize,
    /// The best known path from the start to `node.state`.
    pub path: Path<St, A, C>,
}

impl<St, A, C> TraceStep<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    /// The state this step expanded.
    #[inline(always)]
    pub fn state(&self) -> &St {
        &self.node.state
    }

    /// The state `node` was reached from, if it's not the start.
    pub fn predecessor(&self) -> Option<&St> {
        let n = self.path.states.len();
        (n >= 2).then(|| &self.path.states[n - 2])
    }

    /// The action that reached `node`, if it's not the start.
    pub fn via(&self) -> Option<&A> {
        self.path.actions.last()
    }
}

/// The append-only record of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Trace<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    mode: Mode,
    level: TraceLevel,
    steps: Vec<TraceStep<St, A, C>>,
    /// Every expanded state, in expansion order.
    expansion_order: Vec<St>,
}

impl<St, A, C> Trace<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub(crate) fn new(mode: Mode, level: TraceLevel) -> Self {
        Self {
            mode,
            level,
            steps: vec![],
            expansion_order: vec![],
        }
    }

    /// Appends an expansion.
    ///
    /// Callers skip taking snapshots the level doesn't keep, this only checks.
    pub(crate) fn record(
        &mut self,
        node: SearchNode<St, C>,
        frontier: Option<Vec<SearchNode<St, C>>>,
        path: Path<St, A, C>,
    ) {
        debug_assert_ne!(self.level, TraceLevel::None);
        debug_assert_eq!(frontier.is_some(), self.level == TraceLevel::Full);
        debug_assert_eq!(path.end(), Some(&node.state));
        debug_assert!(
            !self.expansion_order.contains(&node.state),
            "{:?} was expanded twice",
            node.state
        );

        self.expansion_order.push(node.state);
        self.steps.push(TraceStep {
            index: self.steps.len(),
            node,
            frontier,
            expanded_len: self.expansion_order.len(),
            path,
        });
    }

    #[inline(always)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline(always)]
    pub fn level(&self) -> TraceLevel {
        self.level
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline(always)]
    pub fn step(&self, index: usize) -> Option<&TraceStep<St, A, C>> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[TraceStep<St, A, C>] {
        &self.steps
    }

    /// The expanded set as it was at `step`, in expansion order.
    pub fn expanded(&self, step: &TraceStep<St, A, C>) -> &[St] {
        &self.expansion_order[..step.expanded_len]
    }

    /// The step that expanded `s`, if any.
    pub fn step_expanding(&self, s: &St) -> Option<&TraceStep<St, A, C>> {
        self.steps.iter().find(|step| step.node.state == *s)
    }

    /// A cursor over this trace, starting at the first step.
    pub fn replay(&self) -> Replay<'_, St, A, C> {
        Replay {
            trace: self,
            index: 0,
        }
    }

    /// Rough heap usage of the recorded data.
    pub fn approx_bytes(&self) -> usize {
        use std::mem::size_of;

        let steps = self.steps.len() * size_of::<TraceStep<St, A, C>>();
        let order = self.expansion_order.len() * size_of::<St>();
        let snapshots: usize = self
            .steps
            .iter()
            .map(|s| {
                s.frontier.as_ref().map_or(0, Vec::len) * size_of::<SearchNode<St, C>>()
                    + s.path.states.len() * size_of::<St>()
                    + s.path.actions.len() * size_of::<A>()
            })
            .sum();
        steps + order + snapshots
    }
}

/// A position within a [`Trace`].
///
/// Moving past either end does nothing, so callers can wire buttons straight
/// to [`Replay::step_forward`] and [`Replay::step_back`].
#[derive(Copy, Clone, Debug)]
pub struct Replay<'t, St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    trace: &'t Trace<St, A, C>,
    index: usize,
}

impl<'t, St, A, C> Replay<'t, St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The step under the cursor. `None` only for an empty trace.
    pub fn current(&self) -> Option<&'t TraceStep<St, A, C>> {
        self.trace.step(self.index)
    }

    /// The expanded set at the current step.
    pub fn expanded(&self) -> &'t [St] {
        match self.current() {
            Some(step) => self.trace.expanded(step),
            None => &[],
        }
    }

    /// Moves to the next step. Returns whether the cursor moved.
    pub fn step_forward(&mut self) -> bool {
        if self.index + 1 < self.trace.len() {
            self.index += 1;
            return true;
        }
        false
    }

    /// Moves to the previous step. Returns whether the cursor moved.
    pub fn step_back(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            return true;
        }
        false
    }

    /// Moves to `index`. Returns whether `index` was in range; if it wasn't
    /// the cursor stays where it was.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.trace.len() {
            self.index = index;
            return true;
        }
        false
    }

    pub fn is_at_start(&self) -> bool {
        self.index == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.index + 1 >= self.trace.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_of(states: &[u8]) -> Trace<u8, u8, u32> {
        let mut trace = Trace::new(Mode::AStar, TraceLevel::Full);
        let mut path = Path::new_from_start(states[0]);
        for (i, &s) in states.iter().enumerate() {
            if i > 0 {
                path.append((s, s), 1);
            }
            let node = SearchNode::new(Mode::AStar, s, i as u32, 0, i as u64);
            trace.record(node, Some(vec![]), path.clone());
        }
        trace
    }

    #[test]
    fn expanded_prefix_grows() {
        let trace = trace_of(&[3, 1, 4]);
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.expanded(&trace.steps()[0]), &[3]);
        assert_eq!(trace.expanded(&trace.steps()[2]), &[3, 1, 4]);
        assert_eq!(trace.step_expanding(&1).map(|s| s.index), Some(1));
        assert_eq!(trace.steps()[0].frontier, Some(vec![]));
    }

    #[test]
    fn empty_trace_has_no_current_step() {
        let trace: Trace<u8, u8, u32> = Trace::new(Mode::AStar, TraceLevel::None);
        assert!(trace.is_empty());
        assert!(trace.replay().current().is_none());
        assert!(trace.replay().expanded().is_empty());
        assert!(trace.replay().is_at_end());
    }

    #[test]
    fn expansions_level_skips_frontier() {
        let mut trace: Trace<u8, u8, u32> = Trace::new(Mode::AStar, TraceLevel::Expansions);
        trace.record(
            SearchNode::new(Mode::AStar, 1, 0, 0, 0),
            None,
            Path::new_from_start(1),
        );
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.steps()[0].frontier, None);
        assert_eq!(trace.level(), TraceLevel::Expansions);
    }

    #[test]
    fn replay_clamps_at_both_ends() {
        let trace = trace_of(&[3, 1, 4]);
        let mut replay = trace.replay();
        assert!(replay.is_at_start());
        assert!(!replay.step_back());
        assert_eq!(replay.index(), 0);

        assert!(replay.step_forward());
        assert!(replay.step_forward());
        assert!(replay.is_at_end());
        assert!(!replay.step_forward());
        assert_eq!(replay.current().map(|s| *s.state()), Some(4));
    }

    #[test]
    fn replay_round_trip_from_interior() {
        let trace = trace_of(&[3, 1, 4, 5, 9]);
        let mut replay = trace.replay();
        for i in 1..trace.len() - 1 {
            assert!(replay.jump_to(i));
            let before = replay.current().cloned();
            assert!(replay.step_forward());
            assert!(replay.step_back());
            assert_eq!(replay.current().cloned(), before);
            assert_eq!(replay.index(), i);
        }
    }

    #[test]
    fn out_of_range_jump_is_a_no_op() {
        let trace = trace_of(&[3, 1, 4]);
        let mut replay = trace.replay();
        assert!(replay.jump_to(1));
        assert!(!replay.jump_to(3));
        assert!(!replay.jump_to(usize::MAX));
        assert_eq!(replay.index(), 1);
        assert_eq!(replay.expanded(), &[3, 1]);
    }

    #[test]
    fn predecessor_and_via() {
        let trace = trace_of(&[3, 1, 4]);
        assert_eq!(trace.steps()[0].predecessor(), None);
        assert_eq!(trace.steps()[2].predecessor(), Some(&1));
        assert_eq!(trace.steps()[2].via(), Some(&4));
    }
}
