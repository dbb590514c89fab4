//! Weighted road maps between named cities.
//!
//! Cities are interned into [`CityId`]s when the map is built, the search
//! only ever sees the ids.
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Heuristic;
use crate::space::Space;
use crate::space::State;
use crate::space::Successor;
use crate::space::Successors;

/// A city of a [`RoadMap`]. Resolve its name with [`RoadMap::name`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CityId(pub u16);
impl State for CityId {}

impl CityId {
    #[inline(always)]
    fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Driving from one city to a neighbouring one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Road {
    pub from: CityId,
    pub to: CityId,
}
impl Action for Road {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoadMapError {
    #[error("Unknown city '{0}'")]
    UnknownCity(String),
    #[error("City '{0}' was already added")]
    DuplicateCity(String),
    #[error("Road from '{from}' to '{to}' was already added")]
    DuplicateRoad { from: String, to: String },
    #[error("Road from '{from}' to '{to}' must have a positive cost")]
    InvalidCost { from: String, to: String },
    #[error("City '{0}' must have a non-negative estimate")]
    InvalidEstimate(String),
    #[error("City '{0}' has no heuristic entry")]
    MissingHeuristicEntry(String),
    #[error("The heuristic of its target city '{0}' must be 0")]
    NonZeroTargetEstimate(String),
    #[error("Too many cities, at most {} are supported", u16::MAX)]
    TooManyCities,
}

#[derive(Clone, Debug)]
struct City<C: Cost> {
    name: String,
    /// Estimated cost to the target city.
    estimate: Option<C>,
    /// Outgoing roads, in the order they were added.
    roads: Vec<(CityId, C)>,
}

/// Builds a [`RoadMap`], checking every name as it goes.
///
/// ```
/// use informed_search::problems::road_map::RoadMapBuilder;
///
/// let mut builder = RoadMapBuilder::<u32>::new();
/// builder.add_city("A")?.add_city("B")?;
/// builder.add_road("A", "B", 7)?;
/// builder.add_estimate("A", 5)?.add_estimate("B", 0)?;
///
/// let map = builder.build("B")?;
/// assert_eq!(map.len(), 2);
/// # Ok::<(), informed_search::problems::road_map::RoadMapError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct RoadMapBuilder<C: Cost> {
    cities: Vec<City<C>>,
    ids: FxHashMap<String, CityId>,
}

impl<C: Cost> RoadMapBuilder<C> {
    pub fn new() -> Self {
        Self {
            cities: vec![],
            ids: FxHashMap::default(),
        }
    }

    fn id(&self, name: &str) -> Result<CityId, RoadMapError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| RoadMapError::UnknownCity(name.to_string()))
    }

    /// Declares a city. Its neighbours are listed in the order roads are added.
    pub fn add_city(&mut self, name: &str) -> Result<&mut Self, RoadMapError> {
        if self.ids.contains_key(name) {
            return Err(RoadMapError::DuplicateCity(name.to_string()));
        }
        let id = u16::try_from(self.cities.len()).map_err(|_| RoadMapError::TooManyCities)?;
        self.ids.insert(name.to_string(), CityId(id));
        self.cities.push(City {
            name: name.to_string(),
            estimate: None,
            roads: vec![],
        });
        Ok(self)
    }

    /// Sets the estimated cost from `name` to the target city.
    pub fn add_estimate(&mut self, name: &str, h: C) -> Result<&mut Self, RoadMapError> {
        let id = self.id(name)?;
        if !h.valid() || h < C::zero() {
            return Err(RoadMapError::InvalidEstimate(name.to_string()));
        }
        self.cities[id.index()].estimate = Some(h);
        Ok(self)
    }

    /// Adds a one-way road. Its cost must be positive and valid.
    pub fn add_edge(&mut self, from: &str, to: &str, cost: C) -> Result<&mut Self, RoadMapError> {
        let a = self.id(from)?;
        let b = self.id(to)?;
        // Path reconstruction follows parents back, and needs them acyclic.
        if !cost.valid() || cost <= C::zero() {
            return Err(RoadMapError::InvalidCost {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let roads = &mut self.cities[a.index()].roads;
        if roads.iter().any(|&(c, _)| c == b) {
            return Err(RoadMapError::DuplicateRoad {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        roads.push((b, cost));
        Ok(self)
    }

    /// Adds a road usable both ways.
    pub fn add_road(&mut self, a: &str, b: &str, cost: C) -> Result<&mut Self, RoadMapError> {
        self.add_edge(a, b, cost)?;
        self.add_edge(b, a, cost)
    }

    /// Finishes the map, with estimates towards `target`.
    ///
    /// Every city needs an estimate, and the target's must be 0.
    pub fn build(self, target: &str) -> Result<RoadMap<C>, RoadMapError> {
        let target = self.id(target)?;

        let mut estimates = Vec::with_capacity(self.cities.len());
        let mut names = Vec::with_capacity(self.cities.len());
        let mut roads = Vec::with_capacity(self.cities.len());
        for city in self.cities {
            let h = city
                .estimate
                .ok_or_else(|| RoadMapError::MissingHeuristicEntry(city.name.clone()))?;
            estimates.push(h);
            names.push(city.name);
            roads.push(city.roads);
        }

        if estimates[target.index()] != C::zero() {
            return Err(RoadMapError::NonZeroTargetEstimate(
                names[target.index()].clone(),
            ));
        }

        log::debug!(
            "Built road map with {} cities and {} roads",
            names.len(),
            roads.iter().map(Vec::len).sum::<usize>()
        );
        Ok(RoadMap {
            names,
            ids: self.ids,
            roads,
            estimates,
            target,
        })
    }
}

/// Cities joined by weighted roads, plus a table of estimates to one of them.
#[derive(Clone, Debug)]
pub struct RoadMap<C: Cost> {
    names: Vec<String>,
    ids: FxHashMap<String, CityId>,
    roads: Vec<Vec<(CityId, C)>>,
    estimates: Vec<C>,
    target: CityId,
}

impl<C: Cost> RoadMap<C> {
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The name of a city of this map.
    ///
    /// Ids from other maps may be out of range, those get `"?"`.
    pub fn name(&self, city: CityId) -> &str {
        self.names.get(city.index()).map_or("?", String::as_str)
    }

    pub fn city(&self, name: &str) -> Result<CityId, RoadMapError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| RoadMapError::UnknownCity(name.to_string()))
    }

    /// All cities, in declaration order.
    pub fn cities(&self) -> impl Iterator<Item = CityId> + '_ {
        (0..self.names.len()).map(|i| CityId(i as u16))
    }

    /// The city the estimates point at.
    pub fn target(&self) -> CityId {
        self.target
    }

    /// The estimated cost from `city` to the target.
    ///
    /// Ids from other maps may be out of range, those get 0.
    pub fn estimate(&self, city: CityId) -> C {
        self.estimates
            .get(city.index())
            .copied()
            .unwrap_or_else(C::zero)
    }

    /// The cost of the direct road between two cities, if there's one.
    pub fn road_cost(&self, from: CityId, to: CityId) -> Option<C> {
        self.roads
            .get(from.index())?
            .iter()
            .find_map(|&(c, cost)| (c == to).then_some(cost))
    }

    /// Adds up the roads along `cities`. `None` if two consecutive cities
    /// aren't joined by a road.
    pub fn path_cost(&self, cities: &[CityId]) -> Option<C> {
        cities.windows(2).try_fold(C::zero(), |acc, pair| {
            Some(acc.saturating_add(&self.road_cost(pair[0], pair[1])?))
        })
    }

    /// Names along `cities`, joined by arrows.
    pub fn describe(&self, cities: &[CityId]) -> String {
        cities
            .iter()
            .map(|&c| self.name(c))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl<C: Cost> Space<CityId, Road, C> for RoadMap<C> {
    fn apply(&self, s: &CityId, a: &Road) -> Option<CityId> {
        (a.from == *s && self.road_cost(a.from, a.to).is_some()).then_some(a.to)
    }

    fn cost(&self, s: &CityId, a: &Road) -> C {
        self.road_cost(*s, a.to).unwrap_or_else(C::max_value)
    }

    fn neighbours(&self, s: &CityId) -> Vec<(CityId, Road)> {
        self.successors(s)
            .into_iter()
            .map(|succ| (succ.state, succ.action))
            .collect()
    }

    /// Neighbours in the order their roads were added.
    fn successors(&self, s: &CityId) -> Successors<CityId, Road, C> {
        self.roads
            .get(s.index())
            .into_iter()
            .flatten()
            .map(|&(to, cost)| Successor {
                state: to,
                action: Road { from: *s, to },
                cost,
            })
            .collect()
    }

    fn valid(&self, s: &CityId) -> bool {
        s.index() < self.names.len()
    }
}

/// The straight-line distance table of the map.
///
/// The table only measures distances to the map's target. Towards any other
/// goal it uses `|h(s) - h(goal)|`, which the triangle inequality keeps
/// admissible, and consistent if the table is.
#[derive(Copy, Clone, Debug, Default)]
pub struct StraightLineDistance;

impl<C: Cost> Heuristic<RoadMap<C>, CityId, Road, C> for StraightLineDistance {
    fn h(&self, space: &RoadMap<C>, s: &CityId, goal: &CityId) -> C {
        let h = space.estimate(*s);
        if *goal == space.target() {
            return h;
        }
        let h_goal = space.estimate(*goal);
        if h > h_goal { h - h_goal } else { h_goal - h }
    }
}

/// Straight-line distances to Bucharest.
#[rustfmt::skip]
const ROMANIA_ESTIMATES: [(&str, u32); 20] = [
    ("Arad", 366), ("Bucharest", 0), ("Craiova", 160), ("Drobeta", 242),
    ("Eforie", 161), ("Fagaras", 176), ("Giurgiu", 77), ("Hirsova", 151),
    ("Iasi", 226), ("Lugoj", 244), ("Mehadia", 241), ("Neamt", 234),
    ("Oradea", 380), ("Pitesti", 100), ("Rimnicu Vilcea", 193), ("Sibiu", 253),
    ("Timisoara", 329), ("Urziceni", 80), ("Vaslui", 199), ("Zerind", 374),
];

/// Every city with its roads, in expansion order.
#[rustfmt::skip]
const ROMANIA_ROADS: [(&str, &[(&str, u32)]); 20] = [
    ("Arad", &[("Zerind", 75), ("Sibiu", 140), ("Timisoara", 118)]),
    ("Zerind", &[("Arad", 75), ("Oradea", 71)]),
    ("Oradea", &[("Zerind", 71), ("Sibiu", 151)]),
    ("Sibiu", &[("Arad", 140), ("Oradea", 151), ("Fagaras", 99), ("Rimnicu Vilcea", 80)]),
    ("Fagaras", &[("Sibiu", 99), ("Bucharest", 211)]),
    ("Rimnicu Vilcea", &[("Sibiu", 80), ("Pitesti", 97), ("Craiova", 146)]),
    ("Pitesti", &[("Rimnicu Vilcea", 97), ("Craiova", 138), ("Bucharest", 101)]),
    ("Timisoara", &[("Arad", 118), ("Lugoj", 111)]),
    ("Lugoj", &[("Timisoara", 111), ("Mehadia", 70)]),
    ("Mehadia", &[("Lugoj", 70), ("Drobeta", 75)]),
    ("Drobeta", &[("Mehadia", 75), ("Craiova", 120)]),
    ("Craiova", &[("Drobeta", 120), ("Pitesti", 138), ("Rimnicu Vilcea", 146)]),
    ("Bucharest", &[("Fagaras", 211), ("Pitesti", 101), ("Giurgiu", 90), ("Urziceni", 85)]),
    ("Urziceni", &[("Bucharest", 85), ("Hirsova", 98), ("Vaslui", 142)]),
    ("Hirsova", &[("Urziceni", 98), ("Eforie", 86)]),
    ("Eforie", &[("Hirsova", 86)]),
    ("Vaslui", &[("Urziceni", 142), ("Iasi", 92)]),
    ("Iasi", &[("Vaslui", 92), ("Neamt", 87)]),
    ("Neamt", &[("Iasi", 87)]),
    ("Giurgiu", &[("Bucharest", 90)]),
];

impl RoadMap<u32> {
    /// The map of Romania, with straight-line distances to Bucharest.
    pub fn romania() -> Result<Self, RoadMapError> {
        let mut builder = RoadMapBuilder::new();
        for (city, _) in ROMANIA_ROADS {
            builder.add_city(city)?;
        }
        for (city, roads) in ROMANIA_ROADS {
            for &(to, cost) in roads {
                builder.add_edge(city, to, cost)?;
            }
        }
        for (city, h) in ROMANIA_ESTIMATES {
            builder.add_estimate(city, h)?;
        }
        builder.build("Bucharest")
    }
}
