use std::process::ExitCode;

use anstream::eprintln;
use anstream::println;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use env_logger::Builder;
use log::LevelFilter;
use owo_colors::OwoColorize;
use thiserror::Error;
use thousands::Separable;

use informed_search::algorithms::informed::InformedSearch;
use informed_search::algorithms::informed::SearchOptions;
use informed_search::algorithms::informed::SearchResult;
use informed_search::explain::DiagnosticReport;
use informed_search::node::Mode;
use informed_search::problems::road_map::CityId;
use informed_search::problems::road_map::Road;
use informed_search::problems::road_map::RoadMap;
use informed_search::problems::road_map::RoadMapError;
use informed_search::problems::road_map::StraightLineDistance;
use informed_search::problems::tile_puzzle::ManhattanDistance;
use informed_search::problems::tile_puzzle::MisplacedTiles;
use informed_search::problems::tile_puzzle::TileMove;
use informed_search::problems::tile_puzzle::TilePuzzle;
use informed_search::problems::tile_puzzle::Tiles;
use informed_search::problems::tile_puzzle::TilesParseError;
use informed_search::space::Action;
use informed_search::space::Cost;
use informed_search::space::Heuristic;
use informed_search::space::Space;
use informed_search::space::State;
use informed_search::space::ZeroHeuristic;
use informed_search::trace::TraceLevel;
use informed_search::trace::TraceStep;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Step through A* and Greedy Best-First searches
#[derive(Parser, Debug)]
#[clap(long_version = informed_search::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// More logging, repeat for more (-v, -vv). RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve an 8-puzzle
    Puzzle {
        #[command(flatten)]
        puzzle: PuzzleArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Find a route across Romania
    Romania {
        #[command(flatten)]
        route: RouteArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Run A* and GBFS on the same problem
    Compare {
        #[command(subcommand)]
        problem: Problem,
    },
}

#[derive(Subcommand, Debug)]
enum Problem {
    Puzzle(PuzzleArgs),
    Romania(RouteArgs),
}

#[derive(clap::Args, Debug)]
struct PuzzleArgs {
    /// Tiles row by row, 0 is the blank
    #[arg(long, default_value = "7 2 4 5 0 6 8 3 1")]
    start: String,
    #[arg(long, default_value = "0 1 2 3 4 5 6 7 8")]
    goal: String,
    #[arg(long, value_enum, default_value_t = PuzzleHeuristic::Manhattan)]
    heuristic: PuzzleHeuristic,
}

#[derive(clap::Args, Debug)]
struct RouteArgs {
    #[arg(long, default_value = "Arad")]
    from: String,
    #[arg(long, default_value = "Bucharest")]
    to: String,
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    #[arg(short, long, value_enum, default_value_t = Algorithm::Astar)]
    algorithm: Algorithm,

    /// What to record. Frontier snapshots (full) can take a lot of memory
    #[arg(long, value_enum, default_value_t = TraceArg::Expansions)]
    trace: TraceArg,

    /// Give up after this many expansions
    #[arg(long, env = "INFORMED_SEARCH_MAX_STEPS")]
    max_steps: Option<usize>,

    /// Explain every step
    #[arg(long)]
    explain: bool,

    /// Replay a single step
    #[arg(long)]
    step: Option<usize>,

    /// Dump the whole result as JSON
    #[cfg(feature = "serde")]
    #[arg(long)]
    json: Option<std::path::PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum Algorithm {
    #[value(alias = "a*")]
    Astar,
    Gbfs,
}

impl From<Algorithm> for Mode {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::Astar => Mode::AStar,
            Algorithm::Gbfs => Mode::GreedyBestFirst,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum TraceArg {
    None,
    Expansions,
    Full,
}

impl From<TraceArg> for TraceLevel {
    fn from(t: TraceArg) -> Self {
        match t {
            TraceArg::None => TraceLevel::None,
            TraceArg::Expansions => TraceLevel::Expansions,
            TraceArg::Full => TraceLevel::Full,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum PuzzleHeuristic {
    Manhattan,
    Misplaced,
    /// No estimate, A* becomes uniform-cost search
    Zero,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Invalid puzzle: {0}")]
    Tiles(#[from] TilesParseError),
    #[error("Invalid route: {0}")]
    RoadMap(#[from] RoadMapError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Results `--json` can write.
#[cfg(feature = "serde")]
trait Dump: serde::Serialize {}
#[cfg(feature = "serde")]
impl<T: serde::Serialize> Dump for T {}
#[cfg(not(feature = "serde"))]
trait Dump {}
#[cfg(not(feature = "serde"))]
impl<T> Dump for T {}

/// How states and actions of a domain get printed.
trait Names<St, A> {
    fn state(&self, s: &St) -> String;
    fn action(&self, a: &A) -> String;

    fn states<'s>(&self, states: impl IntoIterator<Item = &'s St>, sep: &str) -> String
    where
        St: 's,
    {
        states
            .into_iter()
            .map(|s| self.state(s))
            .collect::<Vec<_>>()
            .join(sep)
    }
}

struct PuzzleNames;

impl Names<Tiles, TileMove> for PuzzleNames {
    fn state(&self, s: &Tiles) -> String {
        s.cells()
            .chunks(3)
            .map(|row| {
                row.iter()
                    .map(|t| match t {
                        0 => "_".to_string(),
                        t => t.to_string(),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn action(&self, a: &TileMove) -> String {
        a.to_string()
    }
}

struct CityNames<'m>(&'m RoadMap<u32>);

impl Names<CityId, Road> for CityNames<'_> {
    fn state(&self, s: &CityId) -> String {
        self.0.name(*s).to_string()
    }

    fn action(&self, a: &Road) -> String {
        format!("Drive to {}", self.0.name(a.to))
    }
}

fn print_step<St, A, C>(
    result: &SearchResult<St, A, C>,
    step: &TraceStep<St, A, C>,
    names: &impl Names<St, A>,
) where
    St: State,
    A: Action,
    C: Cost,
{
    let node = &step.node;
    println!(
        "{} {}: expanding {} (g={}, h={}, f={})",
        "Step".bold(),
        step.index.bold(),
        names.state(&node.state).cyan(),
        node.g,
        node.h,
        node.f()
    );
    println!("  Path so far: {}", names.states(&step.path.states, " -> "));
    println!(
        "  Expanded: {}",
        names.states(result.trace.expanded(step), ", ").dimmed()
    );
    if let Some(frontier) = &step.frontier {
        let key = result.mode.key_name();
        println!("  Frontier ({}):", frontier.len());
        for n in frontier {
            println!(
                "    {:<24} g={:<6} h={:<6} {key}={}",
                names.state(&n.state),
                n.g,
                n.h,
                n.priority
            );
        }
    }
}

fn print_report<St, A, C>(report: &DiagnosticReport<St, A, C>, names: &impl Names<St, A>)
where
    St: State,
    A: Action,
    C: Cost,
{
    println!("  {}", report.g_breakdown());
    if !report.candidates.is_empty() {
        println!(
            "  {:<24} {:<24} {:>6} {:>6} {:>6}",
            "Candidate", "Action", "g", "h", "f"
        );
        for c in &report.candidates {
            let row = format!(
                "  {:<24} {:<24} {:>6} {:>6} {:>6}",
                names.state(&c.state),
                names.action(&c.action),
                c.g,
                c.h,
                c.f
            );
            if c.is_chosen {
                println!("{} {}", row.green().bold(), "<- chosen".green());
            } else if c.already_expanded {
                println!("{} {}", row.dimmed(), "(expanded)".dimmed());
            } else {
                println!("{row}");
            }
        }
    }
    println!("  {}", report.rationale_text().italic());
}

fn run_one<Sp, H, St, A, C>(
    space: &Sp,
    heuristic: &H,
    start: St,
    goal: St,
    args: &SearchArgs,
    names: &impl Names<St, A>,
) -> Result<(), CliError>
where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
    SearchResult<St, A, C>: Dump,
{
    let search = InformedSearch::new(space, heuristic).with_options(SearchOptions {
        trace_level: args.trace.into(),
        max_expansions: args.max_steps,
    });
    let result = search.run(start, goal, args.algorithm.into());

    if args.explain {
        for step in result.trace.steps() {
            print_step(&result, step, names);
            if let Some(report) = search.explain(&result, step.index) {
                print_report(&report, names);
            }
        }
        println!();
    }

    if let Some(index) = args.step {
        let mut replay = result.trace.replay();
        if !replay.jump_to(index) {
            println!(
                "{} Step {index} is out of range, the trace has {} steps",
                "warning:".yellow().bold(),
                result.trace.len()
            );
        } else if let Some(step) = replay.current() {
            print_step(&result, step, names);
            if let Some(report) = search.explain(&result, step.index) {
                print_report(&report, names);
            }
            println!();
        }
    }

    if result.is_solved() {
        println!(
            "{} {}",
            "Solution:".green().bold(),
            names.states(&result.path.states, " -> ")
        );
        for (i, a) in result.path.actions.iter().enumerate() {
            println!("  {:>3}. {}", i + 1, names.action(a));
        }
    } else {
        println!("{} {}", "Unsolved:".red().bold(), result.outcome);
    }
    result.write_stats(anstream::stdout())?;

    #[cfg(feature = "serde")]
    if let Some(path) = &args.json {
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(file, &result)?;
        println!("Wrote {:?}", path.yellow());
    }

    Ok(())
}

fn compare<Sp, H, St, A, C>(
    space: &Sp,
    heuristic: &H,
    start: St,
    goal: St,
    names: &impl Names<St, A>,
) where
    Sp: Space<St, A, C>,
    H: Heuristic<Sp, St, A, C>,
    St: State,
    A: Action,
    C: Cost,
{
    let search = InformedSearch::new(space, heuristic).with_options(SearchOptions {
        trace_level: TraceLevel::None,
        ..Default::default()
    });

    println!(
        "{:<6} {:>10} {:>8} {:>12} {:>12} {:>12}",
        "", "Cost", "Length", "Expanded", "Generated", "Stale"
    );
    for mode in [Mode::AStar, Mode::GreedyBestFirst] {
        let result = search.run(start, goal, mode);
        let stats = &result.stats;
        println!(
            "{:<6} {:>10} {:>8} {:>12} {:>12} {:>12}",
            mode.bold(),
            result.path.cost,
            result.path.len(),
            stats.expanded.separate_with_commas(),
            stats.generated.separate_with_commas(),
            stats.stale.separate_with_commas(),
        );
        if result.is_solved() {
            println!("       {}", names.states(&result.path.states, " -> ").dimmed());
        } else {
            println!("       {}", result.outcome.red());
        }
    }
}

fn parse_puzzle(args: &PuzzleArgs) -> Result<Option<(Tiles, Tiles)>, CliError> {
    let start: Tiles = args.start.parse()?;
    let goal: Tiles = args.goal.parse()?;
    println!("{}\n{start}", "Start:".bold());
    println!("{}\n{goal}", "Goal:".bold());

    if !start.can_reach(&goal) {
        println!(
            "{} no solution, start and goal have different inversion parity",
            "Unsolved:".red().bold()
        );
        return Ok(None);
    }
    Ok(Some((start, goal)))
}

fn parse_route(map: &RoadMap<u32>, args: &RouteArgs) -> Result<(CityId, CityId), CliError> {
    let from = map.city(&args.from)?;
    let to = map.city(&args.to)?;
    if to != map.target() {
        log::warn!(
            "Straight-line distances point at {}, estimating towards {} as |h(s) - h({})|",
            map.name(map.target()),
            args.to,
            args.to
        );
    }
    Ok((from, to))
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Puzzle { puzzle, search } => {
            let Some((start, goal)) = parse_puzzle(&puzzle)? else {
                return Ok(());
            };
            match puzzle.heuristic {
                PuzzleHeuristic::Manhattan => {
                    run_one(&TilePuzzle, &ManhattanDistance, start, goal, &search, &PuzzleNames)
                }
                PuzzleHeuristic::Misplaced => {
                    run_one(&TilePuzzle, &MisplacedTiles, start, goal, &search, &PuzzleNames)
                }
                PuzzleHeuristic::Zero => {
                    run_one(&TilePuzzle, &ZeroHeuristic, start, goal, &search, &PuzzleNames)
                }
            }
        }
        Command::Romania { route, search } => {
            let map = RoadMap::romania()?;
            let (from, to) = parse_route(&map, &route)?;
            run_one(&map, &StraightLineDistance, from, to, &search, &CityNames(&map))
        }
        Command::Compare {
            problem: Problem::Puzzle(puzzle),
        } => {
            let Some((start, goal)) = parse_puzzle(&puzzle)? else {
                return Ok(());
            };
            match puzzle.heuristic {
                PuzzleHeuristic::Manhattan => {
                    compare(&TilePuzzle, &ManhattanDistance, start, goal, &PuzzleNames)
                }
                PuzzleHeuristic::Misplaced => {
                    compare(&TilePuzzle, &MisplacedTiles, start, goal, &PuzzleNames)
                }
                PuzzleHeuristic::Zero => {
                    compare(&TilePuzzle, &ZeroHeuristic, start, goal, &PuzzleNames)
                }
            }
            Ok(())
        }
        Command::Compare {
            problem: Problem::Romania(route),
        } => {
            let map = RoadMap::romania()?;
            let (from, to) = parse_route(&map, &route)?;
            compare(&map, &StraightLineDistance, from, to, &CityNames(&map));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.color.write_global();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new().filter_level(level).parse_default_env().init();
    log::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
