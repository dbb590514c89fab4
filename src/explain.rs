//! Why a step expanded the node it did.
//!
//! The explainer re-generates the successors of the predecessor of a step's
//! node and scores them the way the search did, then compares the winner
//! against the rest of the frontier to tell a clear minimum from a tie.
use std::marker::PhantomData;

use crate::algorithms::informed::SearchResult;
use crate::node::Mode;
use crate::node::SearchNode;
use crate::space::Action;
use crate::space::Cost;
use crate::space::Heuristic;
use crate::space::Space;
use crate::space::State;
use crate::trace::TraceStep;

/// A successor of the predecessor, scored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Candidate<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub state: St,
    pub action: A,
    pub g: C,
    pub h: C,
    /// `g + h` regardless of the mode.
    pub f: C,
    /// The value the frontier ranked it by.
    pub priority: C,
    /// This is the node the step expanded.
    pub is_chosen: bool,
    /// Was expanded before this step, so it couldn't be picked.
    pub already_expanded: bool,
}

/// How the expanded node won.
///
/// Ties are counted over the whole frontier snapshot when the trace kept
/// one, so a tied node needn't be a sibling of the winner. Without a
/// snapshot only the predecessor's other successors can tie.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Rationale<St, C>
where
    St: State,
    C: Cost,
{
    /// The first step, the start was the only node.
    Start,
    /// Nothing else open had as low a priority.
    UniqueMinimum { priority: C },
    /// Other open nodes had the same priority and the earliest inserted won.
    TieBrokenByInsertionOrder {
        priority: C,
        winner: St,
        /// The losers, best ranked first.
        tied: Vec<St>,
    },
}

/// The numbers behind a single step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DiagnosticReport<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub index: usize,
    pub mode: Mode,
    pub node: SearchNode<St, C>,
    pub predecessor: Option<St>,
    /// Successors of the predecessor, in generation order.
    pub candidates: Vec<Candidate<St, A, C>>,
    /// The lowest priority among candidates that weren't expanded yet.
    ///
    /// Expanded candidates are left out, they were never in the running.
    pub min_priority: Option<C>,
    /// The cost of every action on the recorded path to `node`.
    ///
    /// They add up to its `g`, unless a cheaper path to one of its ancestors
    /// turned up after `node` was queued. GBFS doesn't expand states twice,
    /// so `node` keeps the `g` it was queued with.
    pub step_costs: Vec<C>,
    pub rationale: Rationale<St, C>,
}

impl<St, A, C> DiagnosticReport<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn chosen(&self) -> Option<&Candidate<St, A, C>> {
        self.candidates.iter().find(|c| c.is_chosen)
    }

    /// The cost of the recorded path, `None` at the start.
    pub fn path_cost(&self) -> Option<C> {
        if self.step_costs.is_empty() {
            return None;
        }
        Some(
            self.step_costs
                .iter()
                .fold(C::zero(), |acc, c| acc.saturating_add(c)),
        )
    }

    /// `g = c1 + c2 + ... = g`, or just `g = 0` at the start.
    ///
    /// When the recorded path got cheaper after the node was queued, both
    /// numbers are shown.
    pub fn g_breakdown(&self) -> String {
        let Some(path_cost) = self.path_cost() else {
            return format!("g = {}", self.node.g);
        };
        let terms: Vec<String> = self.step_costs.iter().map(|c| c.to_string()).collect();
        if path_cost == self.node.g {
            format!("g = {} = {}", terms.join(" + "), self.node.g)
        } else {
            format!(
                "g = {}, the path found since costs {} = {}",
                self.node.g,
                terms.join(" + "),
                path_cost
            )
        }
    }

    /// One line on how the node was picked.
    pub fn rationale_text(&self) -> String {
        let key = self.mode.key_name();
        match &self.rationale {
            Rationale::Start => "Start node, the only one in the frontier".to_string(),
            Rationale::UniqueMinimum { priority } => {
                format!("Lowest {key} = {priority} uniquely selected it")
            }
            Rationale::TieBrokenByInsertionOrder {
                priority,
                winner,
                tied,
            } => format!(
                "{} nodes tied at {key} = {priority}; ties go to the node inserted \
                 into the frontier first, which was {winner:?}",
                tied.len() + 1
            ),
        }
    }
}

/// Builds [`DiagnosticReport`]s for the steps of a [`SearchResult`].
#[derive(Debug)]
pub struct DiagnosticExplainer<'a, Sp, H, St, A, C>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    space: &'a Sp,
    heuristic: &'a H,

    _phantom_state: PhantomData<St>,
    _phantom_action: PhantomData<A>,
    _phantom_cost: PhantomData<C>,
}

impl<'a, Sp, H, St, A, C> DiagnosticExplainer<'a, Sp, H, St, A, C>
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
            _phantom_state: PhantomData,
            _phantom_action: PhantomData,
            _phantom_cost: PhantomData,
        }
    }

    /// Explains step `index` of `result`, `None` if there's no such step.
    ///
    /// `result` must come from a search over the same space and heuristic.
    pub fn explain(
        &self,
        result: &SearchResult<St, A, C>,
        index: usize,
    ) -> Option<DiagnosticReport<St, A, C>> {
        let trace = &result.trace;
        let step = trace.step(index)?;
        let mode = trace.mode();
        let expanded_before = &trace.expanded(step)[..step.expanded_len - 1];

        let step_costs: Vec<C> = step
            .path
            .states
            .iter()
            .zip(&step.path.actions)
            .map(|(s, a)| self.space.cost(s, a))
            .collect();

        let predecessor = step.predecessor().copied();
        let candidates = match predecessor {
            None => vec![],
            Some(pred) => {
                // The successors were queued with the g the predecessor was
                // expanded with. The path may have been re-parented since.
                let pred_g = trace.step_expanding(&pred).map_or_else(
                    || {
                        step_costs[..step_costs.len() - 1]
                            .iter()
                            .fold(C::zero(), |acc, c| acc.saturating_add(c))
                    },
                    |s| s.node.g,
                );
                self.candidates(mode, step, pred, pred_g, &result.goal, expanded_before)
            }
        };

        let min_priority = candidates
            .iter()
            .filter(|c| !c.already_expanded)
            .map(|c| c.priority)
            .min();
        if let Some(min) = min_priority
            && min < step.node.priority
        {
            log::warn!(
                "Step {index} expanded {:?} at {}={} but a candidate had {min}",
                step.node.state,
                mode.key_name(),
                step.node.priority
            );
        }

        let rationale = match predecessor {
            None => Rationale::Start,
            Some(_) => {
                let tied = Self::tied(step, &candidates, expanded_before);
                if tied.is_empty() {
                    Rationale::UniqueMinimum {
                        priority: step.node.priority,
                    }
                } else {
                    Rationale::TieBrokenByInsertionOrder {
                        priority: step.node.priority,
                        winner: step.node.state,
                        tied,
                    }
                }
            }
        };

        Some(DiagnosticReport {
            index,
            mode,
            node: step.node,
            predecessor,
            candidates,
            min_priority,
            step_costs,
            rationale,
        })
    }

    fn candidates(
        &self,
        mode: Mode,
        step: &TraceStep<St, A, C>,
        pred: St,
        pred_g: C,
        goal: &St,
        expanded_before: &[St],
    ) -> Vec<Candidate<St, A, C>> {
        let via = step.via().copied();
        self.space
            .successors(&pred)
            .into_iter()
            .map(|succ| {
                let g = pred_g.saturating_add(&succ.cost);
                let h = self.heuristic.h(self.space, &succ.state, goal);
                Candidate {
                    state: succ.state,
                    action: succ.action,
                    g,
                    h,
                    f: g.saturating_add(&h),
                    priority: mode.priority(g, h),
                    is_chosen: succ.state == step.node.state && Some(succ.action) == via,
                    already_expanded: expanded_before.contains(&succ.state),
                }
            })
            .collect()
    }

    /// Open states that had the same priority as the expanded node.
    ///
    /// With a frontier snapshot that's every live entry at that priority,
    /// all of which were inserted after the winner. Without one, only the
    /// predecessor's other successors can be checked.
    fn tied(
        step: &TraceStep<St, A, C>,
        candidates: &[Candidate<St, A, C>],
        expanded_before: &[St],
    ) -> Vec<St> {
        let current = step.node.state;
        let mut tied: Vec<St> = match &step.frontier {
            Some(frontier) => frontier
                .iter()
                .filter(|n| n.priority == step.node.priority)
                .map(|n| n.state)
                .filter(|s| *s != current && !expanded_before.contains(s))
                .collect(),
            None => candidates
                .iter()
                .filter(|c| !c.is_chosen && !c.already_expanded)
                .filter(|c| c.priority == step.node.priority)
                .map(|c| c.state)
                .filter(|s| *s != current)
                .collect(),
        };

        // A state may be queued more than once, name it once.
        let mut seen = Vec::with_capacity(tied.len());
        tied.retain(|s| {
            if seen.contains(s) {
                return false;
            }
            seen.push(*s);
            true
        });
        tied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::informed::InformedSearch;
    use crate::algorithms::informed::SearchOptions;
    use crate::problems::road_map::RoadMap;
    use crate::problems::road_map::RoadMapBuilder;
    use crate::problems::road_map::StraightLineDistance;
    use crate::problems::tile_puzzle::ManhattanDistance;
    use crate::problems::tile_puzzle::TilePuzzle;
    use crate::problems::tile_puzzle::Tiles;
    use crate::trace::TraceLevel;

    #[test]
    fn romania_astar_steps() {
        let map = RoadMap::romania().unwrap();
        let arad = map.city("Arad").unwrap();
        let bucharest = map.city("Bucharest").unwrap();
        let search = InformedSearch::new(&map, &StraightLineDistance);
        let result = search.run(arad, bucharest, Mode::AStar);

        let first = search.explain(&result, 0).unwrap();
        assert_eq!(first.rationale, Rationale::Start);
        assert!(first.candidates.is_empty());
        assert_eq!(first.g_breakdown(), "g = 0");

        // Sibiu: f = 140 + 253 = 393 beats Timisoara (447) and Zerind (449).
        let second = search.explain(&result, 1).unwrap();
        assert_eq!(second.predecessor, Some(arad));
        assert_eq!(second.rationale, Rationale::UniqueMinimum { priority: 393 });
        assert_eq!(second.min_priority, Some(393));
        let scores: Vec<(&str, u32, u32, u32)> = second
            .candidates
            .iter()
            .map(|c| (map.name(c.state), c.g, c.h, c.f))
            .collect();
        assert_eq!(
            scores,
            vec![
                ("Zerind", 75, 374, 449),
                ("Sibiu", 140, 253, 393),
                ("Timisoara", 118, 329, 447),
            ]
        );
        assert_eq!(second.chosen().map(|c| map.name(c.state)), Some("Sibiu"));
        assert!(second.rationale_text().contains("Lowest f = 393"));

        // Rimnicu Vilcea, reached through Sibiu.
        let third = search.explain(&result, 2).unwrap();
        assert_eq!(third.g_breakdown(), "g = 140 + 80 = 220");
        let arad_again = third
            .candidates
            .iter()
            .find(|c| c.state == arad)
            .unwrap();
        assert!(arad_again.already_expanded);
        assert!(!arad_again.is_chosen);

        assert!(search.explain(&result, result.trace.len()).is_none());
    }

    /// GBFS reaches X the expensive way, queues Y from it, and only then
    /// finds the cheap way to X through A.
    fn late_shortcut() -> RoadMap<u32> {
        let mut builder = RoadMapBuilder::new();
        for (city, h) in [("S", 5), ("X", 1), ("A", 3), ("Y", 4), ("G", 0)] {
            builder.add_city(city).unwrap().add_estimate(city, h).unwrap();
        }
        let roads = [
            ("S", "X", 10),
            ("S", "A", 1),
            ("A", "X", 1),
            ("X", "Y", 1),
            ("Y", "G", 1),
        ];
        for (from, to, cost) in roads {
            builder.add_edge(from, to, cost).unwrap();
        }
        builder.build("G").unwrap()
    }

    #[test]
    fn candidates_keep_the_queued_g_after_a_shortcut() {
        let map = late_shortcut();
        let s = map.city("S").unwrap();
        let x = map.city("X").unwrap();
        let g = map.city("G").unwrap();
        let search = InformedSearch::new(&map, &StraightLineDistance);
        let result = search.run(s, g, Mode::GreedyBestFirst);
        assert!(result.is_solved());
        let order: Vec<&str> = result
            .trace
            .steps()
            .iter()
            .map(|step| map.name(step.node.state))
            .collect();
        assert_eq!(order, vec!["S", "X", "A", "Y", "G"]);

        for index in 0..result.trace.len() {
            let report = search.explain(&result, index).unwrap();
            if let Some(chosen) = report.chosen() {
                assert_eq!(chosen.g, report.node.g, "step {index}");
                assert_eq!(chosen.priority, report.node.priority, "step {index}");
            }
        }

        // Y was queued from X at g = 10, before X got its cheaper parent.
        let y = search.explain(&result, 3).unwrap();
        assert_eq!(y.predecessor, Some(x));
        assert_eq!(y.node.g, 11);
        assert_eq!(y.path_cost(), Some(3));
        assert_eq!(
            y.g_breakdown(),
            "g = 11, the path found since costs 1 + 1 + 1 = 3"
        );
        assert_eq!(y.rationale, Rationale::UniqueMinimum { priority: 4 });

        let a = search.explain(&result, 2).unwrap();
        assert_eq!(a.g_breakdown(), "g = 1 = 1");
    }

    #[test]
    fn greedy_ranks_by_h() {
        let map = RoadMap::romania().unwrap();
        let arad = map.city("Arad").unwrap();
        let bucharest = map.city("Bucharest").unwrap();
        let search = InformedSearch::new(&map, &StraightLineDistance);
        let result = search.run(arad, bucharest, Mode::GreedyBestFirst);

        let fagaras = search.explain(&result, 2).unwrap();
        assert_eq!(map.name(fagaras.node.state), "Fagaras");
        assert_eq!(fagaras.rationale, Rationale::UniqueMinimum { priority: 176 });
        assert_eq!(fagaras.chosen().map(|c| (c.g, c.h)), Some((239, 176)));
        assert!(fagaras.rationale_text().contains("Lowest h = 176"));
    }

    /// Blank in the centre with its four neighbours home, so every move
    /// costs one more step of Manhattan distance.
    fn four_way_tie() -> Tiles {
        "4 1 2 3 0 5 8 7 6".parse().unwrap()
    }

    fn first_steps() -> SearchOptions {
        SearchOptions {
            max_expansions: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn puzzle_tie_goes_to_first_generated() {
        let start = four_way_tie();
        assert!(start.can_reach(&Tiles::GOAL));
        let search =
            InformedSearch::new(&TilePuzzle, &ManhattanDistance).with_options(first_steps());
        let result = search.run(start, Tiles::GOAL, Mode::AStar);
        assert_eq!(result.trace.len(), 2);

        let report = search.explain(&result, 1).unwrap();
        let up: Tiles = "4 0 2 3 1 5 8 7 6".parse().unwrap();
        assert_eq!(report.node.state, up);
        assert!(report.candidates.iter().all(|c| c.f == 8));
        assert_eq!(report.min_priority, Some(8));

        let Rationale::TieBrokenByInsertionOrder {
            priority,
            winner,
            tied,
        } = &report.rationale
        else {
            panic!("Expected a tie, got {:?}", report.rationale);
        };
        assert_eq!(*priority, 8);
        assert_eq!(*winner, up);
        // Down, Left and Right, in the order they were generated.
        let expected: Vec<Tiles> = report.candidates[1..].iter().map(|c| c.state).collect();
        assert_eq!(*tied, expected);
        assert!(report.rationale_text().contains("inserted into the frontier first"));
    }

    #[test]
    fn ties_without_frontier_snapshots() {
        let start = four_way_tie();
        let search = InformedSearch::new(&TilePuzzle, &ManhattanDistance).with_options(
            SearchOptions {
                trace_level: TraceLevel::Expansions,
                ..first_steps()
            },
        );
        let result = search.run(start, Tiles::GOAL, Mode::GreedyBestFirst);

        let report = search.explain(&result, 1).unwrap();
        match report.rationale {
            Rationale::TieBrokenByInsertionOrder { tied, .. } => assert_eq!(tied.len(), 3),
            other => panic!("Expected a tie, got {other:?}"),
        }
    }

    #[test]
    fn every_winner_is_a_minimum() {
        let start: Tiles = "1 2 5 3 4 0 6 7 8".parse().unwrap();
        for mode in [Mode::AStar, Mode::GreedyBestFirst] {
            let search = InformedSearch::new(&TilePuzzle, &ManhattanDistance);
            let result = search.run(start, Tiles::GOAL, mode);
            assert!(result.is_solved());

            for index in 0..result.trace.len() {
                let report = search.explain(&result, index).unwrap();
                if let Some(min) = report.min_priority {
                    assert!(report.node.priority <= min);
                }
                if let Some(chosen) = report.chosen() {
                    assert_eq!(chosen.priority, report.node.priority);
                    assert_eq!(chosen.g, report.node.g);
                }
                let g = report.step_costs.iter().sum::<u32>();
                assert_eq!(g, report.node.g);
            }
        }
    }
}
