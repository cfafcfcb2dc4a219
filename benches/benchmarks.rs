criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(30)
        .measurement_time(std::time::Duration::from_secs(3));
    targets =
        stepping_a_tick,
        pathfinding_to_the_nearest_lambda,
        generating_choices,
        iterating_the_tree_planner,
        iterating_the_ucb1_planner,
}

use lambda_lifter::cave::action::Action;
use lambda_lifter::cave::reader::read_world;
use lambda_lifter::heuristic::astar;
use lambda_lifter::heuristic::choices;
use lambda_lifter::search::planner::Planner;
use lambda_lifter::search::planner::TreePlanner;
use lambda_lifter::search::planner::Ucb1Planner;

const MAP: &str = "\
#########
#..\\....#
#.***...#
#.......#
#.R...\\O#
#########
";

fn stepping_a_tick(c: &mut criterion::Criterion) {
    let world = read_world(MAP).expect("benchmark fixture parses");
    c.bench_function("step a single tick", |b| {
        b.iter(|| world.step(Action::Wait))
    });
}

fn pathfinding_to_the_nearest_lambda(c: &mut criterion::Criterion) {
    let world = read_world(MAP).expect("benchmark fixture parses");
    let goal = *world.lambdas().iter().next().expect("fixture has a lambda");
    c.bench_function("A* to the nearest lambda", |b| {
        b.iter(|| astar::find_path(world.grid(), world.robot(), goal))
    });
}

fn generating_choices(c: &mut criterion::Criterion) {
    let world = read_world(MAP).expect("benchmark fixture parses");
    c.bench_function("generate candidate choices", |b| {
        b.iter(|| choices::generate(&world))
    });
}

fn iterating_the_tree_planner(c: &mut criterion::Criterion) {
    let world = read_world(MAP).expect("benchmark fixture parses");
    c.bench_function("tree planner iterate (cold tree each sample)", |b| {
        b.iter_batched(
            || TreePlanner::new(world.clone()),
            |mut planner| planner.iterate(),
            criterion::BatchSize::SmallInput,
        )
    });
}

fn iterating_the_ucb1_planner(c: &mut criterion::Criterion) {
    let world = read_world(MAP).expect("benchmark fixture parses");
    c.bench_function("ucb1 planner iterate (cold tree each sample)", |b| {
        b.iter_batched(
            || Ucb1Planner::new(world.clone()),
            |mut planner| planner.iterate(),
            criterion::BatchSize::SmallInput,
        )
    });
}
