//! A* and Greedy Best-First search with step tracing.
//!
//! Both algorithms share one loop; they only differ on the priority key of
//! the frontier (see [`Mode`]).
use std::marker::PhantomData;
use std::time::Duration;

use derive_more::Display;
use hrsw::Stopwatch;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::explain::DiagnosticExplainer;
use crate::explain::DiagnosticReport;
use crate::frontier::PriorityFrontier;
use crate::node::Mode;
use crate::node::SearchNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Heuristic;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;
use crate::trace::Trace;
use crate::trace::TraceLevel;

/// Knobs for a single run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub trace_level: TraceLevel,
    /// Stops the run after this many expansions.
    pub max_expansions: Option<usize>,
}

/// Why a run stopped.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Outcome {
    #[display("goal reached")]
    GoalReached,
    /// The frontier ran out. There's no path to the goal.
    #[display("no solution")]
    Exhausted,
    #[display("expansion budget of {_0} exhausted")]
    BudgetExhausted(usize),
}

/// Counters of a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchStats {
    /// Distinct states expanded.
    pub expanded: usize,
    /// Nodes pushed into the frontier, the start included.
    pub generated: usize,
    /// Popped nodes whose state was already expanded.
    pub stale: usize,
    pub peak_frontier: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub elapsed: Duration,
}

/// Everything a run produced. It doesn't borrow from the search.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchResult<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub start: St,
    pub goal: St,
    pub mode: Mode,
    pub outcome: Outcome,
    /// Empty unless the goal was reached.
    pub path: Path<St, A, C>,
    pub trace: Trace<St, A, C>,
    pub stats: SearchStats,
}

impl<St, A, C> SearchResult<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    pub fn is_solved(&self) -> bool {
        self.outcome == Outcome::GoalReached
    }

    pub fn write_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use human_duration::human_duration;
        use size::Size;
        use thousands::Separable;

        writeln!(out, "{} Search Stats:", self.mode)?;
        writeln!(out, "  - Outcome: {}", self.outcome)?;
        if self.is_solved() {
            writeln!(
                out,
                "  - Path: {} actions, cost {}",
                self.path.len().separate_with_commas(),
                self.path.cost
            )?;
        }
        writeln!(
            out,
            "  - Expanded nodes: {}",
            self.stats.expanded.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Generated nodes: {}",
            self.stats.generated.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Stale nodes: {}",
            self.stats.stale.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - |Open|*: {}",
            self.stats.peak_frontier.separate_with_commas()
        )?;
        writeln!(
            out,
            "  - Trace: {} steps ({})",
            self.trace.len().separate_with_commas(),
            Size::from_bytes(self.trace.approx_bytes())
        )?;
        writeln!(out, "  - Time: {}", human_duration(&self.stats.elapsed))?;

        Ok(())
    }
}

/// How a state was reached on its best known path.
#[derive(Copy, Clone, Debug)]
struct Parent<St, A, C> {
    state: St,
    action: A,
    cost: C,
}

/// The search of a single run.
///
/// Owns the open list, the closed list and the cost and parent maps, and
/// drops them once the run turns into a [`SearchResult`].
struct Run<'a, Sp, H, St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    space: &'a Sp,
    heuristic: &'a H,
    goal: St,
    mode: Mode,

    open: PriorityFrontier<St, C>,
    /// Lowest `g` found so far.
    best_cost: FxHashMap<St, C>,
    parents: FxHashMap<St, Parent<St, A, C>>,
    closed: FxHashSet<St>,

    trace: Trace<St, A, C>,
    stats: SearchStats,
}

impl<Sp, H, St, A, C> Run<'_, Sp, H, St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn h(&self, s: &St) -> C {
        self.heuristic.h(self.space, s, &self.goal)
    }

    fn push(&mut self, s: St, g: C) {
        let h = self.h(&s);
        let node = SearchNode::new(self.mode, s, g, h, self.open.next_sequence());
        self.open.push(node);
        self.stats.generated += 1;
    }

    /// Follows the parent map back to the start.
    fn path_to(&self, s: &St) -> Path<St, A, C> {
        let mut path = Path::<St, A, C>::new_from_start(*s);

        let mut state = *s;
        while let Some(parent) = self.parents.get(&state) {
            debug_assert!(
                path.states.len() <= self.parents.len(),
                "Parent map has a cycle through {state:?}"
            );
            path.append((parent.state, parent.action), parent.cost);
            state = parent.state;
        }

        path.reverse();
        path
    }

    fn search(&mut self, start: St, max_expansions: Option<usize>) -> Outcome {
        self.best_cost.insert(start, C::zero());
        self.push(start, C::zero());

        loop {
            if let Some(budget) = max_expansions
                && self.stats.expanded >= budget
            {
                log::warn!("{} search stopped after {budget} expansions", self.mode);
                return Outcome::BudgetExhausted(budget);
            }

            let Some(mut node) = self.open.pop_min() else {
                return Outcome::Exhausted;
            };

            if self.closed.contains(&node.state) {
                self.stats.stale += 1;
                continue;
            }

            // A node may have been pushed before a cheaper path to its state
            // was found. Expand it along the cheapest one.
            let g = self.best_cost[&node.state];
            debug_assert!(g <= node.g);
            if g < node.g {
                node = SearchNode::new(self.mode, node.state, g, node.h, node.sequence);
            }

            self.closed.insert(node.state);
            self.stats.expanded += 1;
            log::trace!(
                "Expanding {:?} (g={}, h={}, {}={})",
                node.state,
                node.g,
                node.h,
                self.mode.key_name(),
                node.priority
            );
            let level = self.trace.level();
            if level != TraceLevel::None {
                let frontier = (level == TraceLevel::Full).then(|| self.open.peek_all());
                let path = self.path_to(&node.state);
                self.trace.record(node, frontier, path);
            }

            if node.state == self.goal {
                return Outcome::GoalReached;
            }

            for successor in self.space.successors(&node.state) {
                let tentative_g = node.g.saturating_add(&successor.cost);
                let improves = match self.best_cost.get(&successor.state) {
                    Some(&best) => tentative_g < best,
                    None => true,
                };
                if !improves {
                    continue;
                }

                self.best_cost.insert(successor.state, tentative_g);
                self.parents.insert(
                    successor.state,
                    Parent {
                        state: node.state,
                        action: successor.action,
                        cost: successor.cost,
                    },
                );
                self.push(successor.state, tentative_g);
            }
        }
    }
}

/// A* and GBFS over a [`Space`] with a [`Heuristic`].
///
/// The search itself keeps no state between runs: every [`InformedSearch::run`]
/// builds its own frontier and maps, so a single instance can be reused, and
/// shared, freely.
#[derive(Debug)]
pub struct InformedSearch<'a, Sp, H, St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    space: &'a Sp,
    heuristic: &'a H,
    options: SearchOptions,

    _phantom_state: PhantomData<St>,
    _phantom_action: PhantomData<A>,
    _phantom_cost: PhantomData<C>,
}

impl<'a, Sp, H, St, A, C> InformedSearch<'a, Sp, H, St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    #[must_use]
    pub fn new(space: &'a Sp, heuristic: &'a H) -> Self {
        Self {
            space,
            heuristic,
            options: SearchOptions::default(),

            _phantom_state: PhantomData,
            _phantom_action: PhantomData,
            _phantom_cost: PhantomData,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn space(&self) -> &'a Sp {
        self.space
    }

    pub fn heuristic(&self) -> &'a H {
        self.heuristic
    }

    /// Searches from `start` to `goal` until the goal is expanded, the
    /// frontier runs out, or the expansion budget is spent.
    ///
    /// Both `start` and `goal` must be valid states of the space.
    pub fn run(&self, start: St, goal: St, mode: Mode) -> SearchResult<St, A, C> {
        debug_assert!(self.space.valid(&start), "Invalid start {start:?}");
        debug_assert!(self.space.valid(&goal), "Invalid goal {goal:?}");
        log::debug!("{mode} search from {start:?} to {goal:?}");

        let mut stopwatch = Stopwatch::new_started();
        let mut run = Run {
            space: self.space,
            heuristic: self.heuristic,
            goal,
            mode,

            open: PriorityFrontier::new(),
            best_cost: FxHashMap::default(),
            parents: FxHashMap::default(),
            closed: FxHashSet::default(),

            trace: Trace::new(mode, self.options.trace_level),
            stats: SearchStats::default(),
        };

        let outcome = run.search(start, self.options.max_expansions);
        let path = match outcome {
            Outcome::GoalReached => run.path_to(&goal),
            Outcome::Exhausted | Outcome::BudgetExhausted(_) => Path::empty(),
        };
        stopwatch.stop();

        let mut stats = run.stats;
        stats.peak_frontier = run.open.peak_len();
        stats.elapsed = stopwatch.elapsed();
        log::debug!(
            "{mode} search {outcome} after {} expansions, path cost {}",
            stats.expanded,
            path.cost
        );

        SearchResult {
            start,
            goal,
            mode,
            outcome,
            path,
            trace: run.trace,
            stats,
        }
    }

    /// Explains the choice made at step `index` of `result`.
    pub fn explain(
        &self,
        result: &SearchResult<St, A, C>,
        index: usize,
    ) -> Option<DiagnosticReport<St, A, C>> {
        DiagnosticExplainer::new(self.space, self.heuristic).explain(result, index)
    }
}

/// Runs a single search with default options.
pub fn run_search<Sp, H, St, A, C>(
    space: &Sp,
    heuristic: &H,
    start: St,
    goal: St,
    mode: Mode,
) -> SearchResult<St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    InformedSearch::new(space, heuristic).run(start, goal, mode)
}
