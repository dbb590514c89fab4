use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use hrsw::Stopwatch;
use human_duration::human_duration;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use informed_search::algorithms::informed::InformedSearch;
use informed_search::algorithms::informed::SearchOptions;
use informed_search::node::Mode;
use informed_search::problems::tile_puzzle::ManhattanDistance;
use informed_search::problems::tile_puzzle::TileCost;
use informed_search::problems::tile_puzzle::TilePuzzle;
use informed_search::problems::tile_puzzle::Tiles;
use informed_search::trace::TraceLevel;

const SCRAMBLE_MOVES: [usize; 3] = [10, 20, 40];

fn solve(start: Tiles, mode: Mode, trace_level: TraceLevel) -> TileCost {
    let search =
        InformedSearch::new(&TilePuzzle, &ManhattanDistance).with_options(SearchOptions {
            trace_level,
            max_expansions: Some(200_000),
        });
    search.run(start, Tiles::GOAL, mode).path.cost
}

fn compare_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("8-puzzle Search");

    for moves in SCRAMBLE_MOVES {
        for i in 0..3 {
            let instance_name = format!("scramble[{moves}]:{i}");
            let mut rng = ChaCha8Rng::seed_from_u64(i);
            let start = TilePuzzle::scramble(&Tiles::GOAL, moves, &mut rng);

            let mut stopwatch = Stopwatch::new_started();
            let astar = InformedSearch::new(&TilePuzzle, &ManhattanDistance)
                .with_options(SearchOptions {
                    trace_level: TraceLevel::None,
                    ..Default::default()
                })
                .run(start, Tiles::GOAL, Mode::AStar);
            stopwatch.stop();
            if !astar.is_solved() {
                log::warn!("Skipping {instance_name}, A* gave up: {}", astar.outcome);
                continue;
            }
            println!(
                "{instance_name}: A* path: {} actions, {} expansions in {}",
                astar.path.len(),
                astar.stats.expanded,
                human_duration(&stopwatch.elapsed())
            );

            for (name, mode) in [("A*", Mode::AStar), ("GBFS", Mode::GreedyBestFirst)] {
                group.bench_with_input(BenchmarkId::new(name, &instance_name), &start, |b, s| {
                    b.iter(|| solve(*s, mode, TraceLevel::None))
                });
                group.bench_with_input(
                    BenchmarkId::new(format!("{name}+trace"), &instance_name),
                    &start,
                    |b, s| b.iter(|| solve(*s, mode, TraceLevel::Expansions)),
                );
            }
        }
    }
    group.finish();
}

criterion_group!(benches, compare_search);
criterion_main!(benches);
