//! The 8-puzzle.
//!
//! Eight numbered tiles and a blank (`0`) on a 3x3 board. A move slides a
//! tile next to the blank into it, which we describe as the blank moving.
use std::str::FromStr;

use derive_more::Display;
use smallvec::SmallVec;
use thiserror::Error;

use crate::space::Action;
use crate::space::Heuristic;
use crate::space::Space;
use crate::space::State;

pub const SIDE: usize = 3;
pub const CELLS: usize = SIDE * SIDE;
pub const BLANK: u8 = 0;

pub type TileCost = u32;

/// A board, read row by row.
///
/// Always holds each of `0..9` exactly once (see [`Tiles::new`]).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Tiles([u8; CELLS]);

impl State for Tiles {}

impl Tiles {
    /// The usual goal, blank first.
    pub const GOAL: Tiles = Tiles([0, 1, 2, 3, 4, 5, 6, 7, 8]);

    pub fn new(cells: [u8; CELLS]) -> Result<Self, TilesParseError> {
        let mut seen = [false; CELLS];
        for &tile in &cells {
            let slot = seen
                .get_mut(tile as usize)
                .ok_or(TilesParseError::OutOfRange { tile })?;
            if *slot {
                return Err(TilesParseError::RepeatedTile { tile });
            }
            *slot = true;
        }
        Ok(Self(cells))
    }

    #[inline(always)]
    pub fn cells(&self) -> &[u8; CELLS] {
        &self.0
    }

    #[inline(always)]
    pub fn blank(&self) -> usize {
        self.position(BLANK)
    }

    /// The index of `tile` on the board.
    #[inline(always)]
    pub fn position(&self, tile: u8) -> usize {
        debug_assert!((tile as usize) < CELLS);
        // Boards are permutations, the tile is always there.
        self.0.iter().position(|&t| t == tile).unwrap_or(CELLS)
    }

    /// The index of every tile on the board.
    pub fn positions(&self) -> [usize; CELLS] {
        let mut positions = [0; CELLS];
        for (i, &tile) in self.0.iter().enumerate() {
            positions[tile as usize] = i;
        }
        positions
    }

    /// Parity of the number of inversions among non-blank tiles.
    fn inversion_parity(&self) -> bool {
        let tiles: SmallVec<[u8; CELLS]> = self.0.iter().copied().filter(|&t| t != BLANK).collect();
        let mut inversions = 0usize;
        for (i, a) in tiles.iter().enumerate() {
            inversions += tiles[i + 1..].iter().filter(|&b| b < a).count();
        }
        inversions % 2 == 1
    }

    /// Whether `goal` can be reached from here at all.
    ///
    /// On an odd-sided board every move preserves the inversion parity, and
    /// boards with the same parity are connected.
    pub fn can_reach(&self, goal: &Tiles) -> bool {
        self.inversion_parity() == goal.inversion_parity()
    }
}

#[inline(always)]
fn row_col(i: usize) -> (usize, usize) {
    (i / SIDE, i % SIDE)
}

impl std::fmt::Display for Tiles {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.0.chunks(SIDE) {
            for (c, tile) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                match *tile {
                    BLANK => write!(f, "_")?,
                    t => write!(f, "{t}")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TilesParseError {
    #[error("Invalid token '{0}', tiles are numbers from 0 to 8")]
    InvalidToken(String),
    #[error("Expected 9 tiles, found {found}")]
    WrongCardinality { found: usize },
    #[error("Tile {tile} is out of range (0-8)")]
    OutOfRange { tile: u8 },
    #[error("Tile {tile} appears more than once")]
    RepeatedTile { tile: u8 },
}

impl FromStr for Tiles {
    type Err = TilesParseError;

    /// Parses 9 numbers separated by spaces and/or commas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != CELLS {
            return Err(TilesParseError::WrongCardinality {
                found: tokens.len(),
            });
        }

        let mut cells = [0u8; CELLS];
        for (cell, token) in cells.iter_mut().zip(tokens) {
            *cell = token
                .parse()
                .map_err(|_| TilesParseError::InvalidToken(token.to_string()))?;
        }
        Tiles::new(cells)
    }
}

impl TryFrom<&str> for Tiles {
    type Error = TilesParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Where the blank moves.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Direction {
    #[display("Up")]
    Up = 0,
    #[display("Down")]
    Down = 1,
    #[display("Left")]
    Left = 2,
    #[display("Right")]
    Right = 3,
}

impl Direction {
    /// Expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Where the blank lands when moving from `blank`, if it stays on the board.
    fn target(&self, blank: usize) -> Option<usize> {
        let (r, c) = row_col(blank);
        #[rustfmt::skip]
        let (r, c) = match self {
            Direction::Up    => (r.checked_sub(1)?, c),
            Direction::Down  => (r + 1,             c),
            Direction::Left  => (r,                 c.checked_sub(1)?),
            Direction::Right => (r,                 c + 1),
        };
        (r < SIDE && c < SIDE).then_some(r * SIDE + c)
    }
}

/// A tile sliding into the blank.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[display("Move tile {tile} ({direction})")]
pub struct TileMove {
    /// The tile that moved.
    pub tile: u8,
    /// Where the blank moved, the tile moves the opposite way.
    pub direction: Direction,
    /// Index the tile moved from (the new blank).
    pub from: u8,
    /// Index the tile moved to (the old blank).
    pub to: u8,
}
impl Action for TileMove {}

impl TileMove {
    /// `(row, col)` the tile moved from.
    pub fn from_cell(&self) -> (usize, usize) {
        row_col(self.from as usize)
    }
    /// `(row, col)` the tile moved to.
    pub fn to_cell(&self) -> (usize, usize) {
        row_col(self.to as usize)
    }
}

/// The 8-puzzle move rules. Every move costs 1.
#[derive(Copy, Clone, Debug, Default)]
pub struct TilePuzzle;

impl TilePuzzle {
    fn slide(s: &Tiles, direction: Direction) -> Option<(Tiles, TileMove)> {
        let blank = s.blank();
        let target = direction.target(blank)?;

        let mut cells = s.0;
        let tile = cells[target];
        cells.swap(blank, target);
        Some((
            Tiles(cells),
            TileMove {
                tile,
                direction,
                from: target as u8,
                to: blank as u8,
            },
        ))
    }

    /// A random walk of `moves` steps from `goal`.
    ///
    /// The result can always reach `goal`. Steps that undo the previous one
    /// are avoided so walks don't collapse.
    pub fn scramble<R: rand::Rng>(goal: &Tiles, moves: usize, r: &mut R) -> Tiles {
        let mut state = *goal;
        let mut previous: Option<usize> = None;
        for _ in 0..moves {
            let options: SmallVec<[(Tiles, TileMove); 4]> = Direction::ALL
                .iter()
                .filter_map(|d| Self::slide(&state, *d))
                .filter(|(_, m)| Some(m.from as usize) != previous)
                .collect();
            let (next, m) = options[r.random_range(0..options.len())];
            previous = Some(m.to as usize);
            state = next;
        }
        state
    }
}

impl Space<Tiles, TileMove, TileCost> for TilePuzzle {
    fn apply(&self, s: &Tiles, a: &TileMove) -> Option<Tiles> {
        let (next, m) = Self::slide(s, a.direction)?;
        (m == *a).then_some(next)
    }

    /// Blank moves Up, Down, Left, Right; skipping the ones off the board.
    fn neighbours(&self, s: &Tiles) -> Vec<(Tiles, TileMove)> {
        Direction::ALL
            .iter()
            .filter_map(|d| Self::slide(s, *d))
            .collect()
    }

    fn valid(&self, s: &Tiles) -> bool {
        Tiles::new(s.0).is_ok()
    }
}

/// How far a single tile is from its goal cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TileDistance {
    pub tile: u8,
    pub current: (usize, usize),
    pub goal: (usize, usize),
    pub row_diff: usize,
    pub col_diff: usize,
}

impl TileDistance {
    pub fn distance(&self) -> usize {
        self.row_diff + self.col_diff
    }
}

impl std::fmt::Display for TileDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (cr, cc) = self.current;
        let (gr, gc) = self.goal;
        write!(
            f,
            "Tile {}: ({cr},{cc}) -> ({gr},{gc}), |{cr}-{gr}| + |{cc}-{gc}| = {} + {} = {}",
            self.tile,
            self.row_diff,
            self.col_diff,
            self.distance()
        )
    }
}

/// Sum of the Manhattan distances of every non-blank tile to its goal cell.
///
/// Admissible and consistent, as a move changes a single tile's distance by 1.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ManhattanDistance;

impl ManhattanDistance {
    /// The per-tile terms of the estimate, in tile order.
    pub fn breakdown(s: &Tiles, goal: &Tiles) -> Vec<TileDistance> {
        let current = s.positions();
        let target = goal.positions();
        (1..CELLS as u8)
            .map(|tile| {
                let (cr, cc) = row_col(current[tile as usize]);
                let (gr, gc) = row_col(target[tile as usize]);
                TileDistance {
                    tile,
                    current: (cr, cc),
                    goal: (gr, gc),
                    row_diff: cr.abs_diff(gr),
                    col_diff: cc.abs_diff(gc),
                }
            })
            .collect()
    }
}

impl Heuristic<TilePuzzle, Tiles, TileMove, TileCost> for ManhattanDistance {
    fn h(&self, _space: &TilePuzzle, s: &Tiles, goal: &Tiles) -> TileCost {
        let current = s.positions();
        let target = goal.positions();
        (1..CELLS)
            .map(|tile| {
                let (cr, cc) = row_col(current[tile]);
                let (gr, gc) = row_col(target[tile]);
                (cr.abs_diff(gr) + cc.abs_diff(gc)) as TileCost
            })
            .sum()
    }
}

/// Number of non-blank tiles out of place.
///
/// Weaker than [`ManhattanDistance`], handy to compare against.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MisplacedTiles;

impl Heuristic<TilePuzzle, Tiles, TileMove, TileCost> for MisplacedTiles {
    fn h(&self, _space: &TilePuzzle, s: &Tiles, goal: &Tiles) -> TileCost {
        s.0.iter()
            .zip(goal.0.iter())
            .filter(|&(&a, &b)| a != BLANK && a != b)
            .count() as TileCost
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    fn tiles(s: &str) -> Tiles {
        s.parse().unwrap()
    }

    #[test]
    fn parse() {
        assert_eq!(tiles("0 1 2 3 4 5 6 7 8"), Tiles::GOAL);
        assert_eq!(tiles("0,1,2, 3,4,5\n6 7 8"), Tiles::GOAL);
        assert_eq!(Tiles::try_from("7 2 4 5 0 6 8 3 1").map(|t| t.blank()), Ok(4));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            "0 1 2 3".parse::<Tiles>(),
            Err(TilesParseError::WrongCardinality { found: 4 })
        );
        assert_eq!(
            "0 1 2 3 4 5 6 7 8 0".parse::<Tiles>(),
            Err(TilesParseError::WrongCardinality { found: 10 })
        );
        assert_eq!(
            "0 1 2 3 4 5 6 7 7".parse::<Tiles>(),
            Err(TilesParseError::RepeatedTile { tile: 7 })
        );
        assert_eq!(
            "0 1 2 3 4 5 6 7 9".parse::<Tiles>(),
            Err(TilesParseError::OutOfRange { tile: 9 })
        );
        assert_eq!(
            "0 1 2 3 4 5 6 7 x".parse::<Tiles>(),
            Err(TilesParseError::InvalidToken("x".to_string()))
        );
        assert_eq!(
            "0 1 2 3 4 5 6 7 -1".parse::<Tiles>(),
            Err(TilesParseError::InvalidToken("-1".to_string()))
        );
    }

    #[test]
    fn display() {
        let expected = indoc! {"
            7 2 4
            5 _ 6
            8 3 1
        "};
        assert_eq!(tiles("7 2 4 5 0 6 8 3 1").to_string(), expected);
    }

    #[test]
    fn successor_order_is_up_down_left_right() {
        // Blank in the centre can go everywhere.
        let s = tiles("7 2 4 5 0 6 8 3 1");
        let moves: Vec<(Direction, u8)> = TilePuzzle
            .successors(&s)
            .iter()
            .map(|succ| (succ.action.direction, succ.action.tile))
            .collect();
        assert_eq!(
            moves,
            vec![
                (Direction::Up, 2),
                (Direction::Down, 3),
                (Direction::Left, 5),
                (Direction::Right, 6),
            ]
        );
        assert!(TilePuzzle.successors(&s).iter().all(|succ| succ.cost == 1));
    }

    #[test]
    fn corners_have_two_successors() {
        let successors = TilePuzzle.successors(&Tiles::GOAL);
        let directions: Vec<Direction> = successors.iter().map(|s| s.action.direction).collect();
        assert_eq!(directions, vec![Direction::Down, Direction::Right]);
        assert_eq!(successors[0].state, tiles("3 1 2 0 4 5 6 7 8"));
        assert_eq!(successors[0].action.from_cell(), (1, 0));
        assert_eq!(successors[0].action.to_cell(), (0, 0));
    }

    #[test]
    fn apply_matches_successors() {
        let s = tiles("1 2 3 4 0 5 6 7 8");
        for succ in TilePuzzle.successors(&s) {
            assert_eq!(TilePuzzle.apply(&s, &succ.action), Some(succ.state));
        }
        // A move recorded on another board doesn't apply here.
        let foreign = TilePuzzle.successors(&Tiles::GOAL)[0].action;
        assert_eq!(TilePuzzle.apply(&s, &foreign), None);
    }

    #[test]
    fn heuristics_are_zero_at_goal() {
        let goal = tiles("1 2 3 4 5 6 7 8 0");
        assert_eq!(ManhattanDistance.h(&TilePuzzle, &goal, &goal), 0);
        assert_eq!(MisplacedTiles.h(&TilePuzzle, &goal, &goal), 0);
        assert_eq!(
            ManhattanDistance.h(&TilePuzzle, &Tiles::GOAL, &Tiles::GOAL),
            0
        );
    }

    #[test]
    fn manhattan_breakdown_adds_up() {
        let s = tiles("7 2 4 5 0 6 8 3 1");
        let breakdown = ManhattanDistance::breakdown(&s, &Tiles::GOAL);
        assert_eq!(breakdown.len(), 8);
        let total: usize = breakdown.iter().map(TileDistance::distance).sum();
        assert_eq!(
            total as TileCost,
            ManhattanDistance.h(&TilePuzzle, &s, &Tiles::GOAL)
        );
        // 7 sits at (0,0) and belongs at (2,1).
        assert_eq!(breakdown[6].tile, 7);
        assert_eq!(breakdown[6].distance(), 3);
        assert_eq!(total, 18);
        assert_eq!(MisplacedTiles.h(&TilePuzzle, &s, &Tiles::GOAL), 8);
    }

    #[test]
    fn solvability_by_parity() {
        assert!(tiles("7 2 4 5 0 6 8 3 1").can_reach(&Tiles::GOAL));
        // Swapping two non-blank tiles flips the parity.
        assert!(!tiles("0 2 1 3 4 5 6 7 8").can_reach(&Tiles::GOAL));
    }

    #[test]
    fn scrambles_stay_solvable() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for moves in [0, 1, 5, 30] {
            let s = TilePuzzle::scramble(&Tiles::GOAL, moves, &mut rng);
            assert!(TilePuzzle.valid(&s));
            assert!(s.can_reach(&Tiles::GOAL));
        }
        assert_eq!(TilePuzzle::scramble(&Tiles::GOAL, 0, &mut rng), Tiles::GOAL);
    }
}
