use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use crate::cave::action;
use crate::cave::action::Action;
use crate::cave::world::World;
use crate::search::plan::Plan;
use crate::search::planner::BeamPlanner;
use crate::search::planner::Planner;
use crate::search::planner::TreePlanner;
use crate::search::planner::Ucb1Planner;
use crate::search::planner::WeightedPlanner;

/// the search backend the driver should run, selected by the CLI's
/// `--name` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Weighted,
    Tree,
    Ucb1,
    Beam(usize),
    Dive,
}

impl std::str::FromStr for Strategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weighted" => Ok(Strategy::Weighted),
            "tree" => Ok(Strategy::Tree),
            "ucb1" => Ok(Strategy::Ucb1),
            "dive" => Ok(Strategy::Dive),
            beam if beam.starts_with("beam") => {
                let width = beam
                    .strip_prefix("beam")
                    .unwrap()
                    .trim_start_matches(':')
                    .parse()
                    .unwrap_or(8);
                Ok(Strategy::Beam(width))
            }
            other => Err(format!("unknown planner strategy: {other}")),
        }
    }
}

fn build(strategy: Strategy, world: World) -> Box<dyn Planner> {
    match strategy {
        Strategy::Weighted => Box::new(WeightedPlanner::new(world)),
        Strategy::Tree => Box::new(TreePlanner::new(world)),
        Strategy::Ucb1 => Box::new(Ucb1Planner::new(world)),
        Strategy::Beam(width) => Box::new(BeamPlanner::new(world, width)),
        Strategy::Dive => Box::new(BeamPlanner::dive(world)),
    }
}

/// the work budget a search is allowed: a fixed iteration count, a wall-clock
/// deadline, or both (whichever is hit first stops the run).
#[derive(Debug, Clone, Copy, Default)]
pub struct Budget {
    pub iterations: Option<u64>,
    pub deadline: Option<Instant>,
}

impl Budget {
    pub fn iterations(n: u64) -> Self {
        Budget {
            iterations: Some(n),
            deadline: None,
        }
    }

    pub fn time(d: Duration) -> Self {
        Budget {
            iterations: None,
            deadline: Some(Instant::now() + d),
        }
    }

    fn exhausted(&self, done: u64) -> bool {
        self.iterations.is_some_and(|n| done >= n) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// runs a [`Planner`] to a [`Budget`], replaying an optional initial path
/// first and stopping early on an external shutdown signal. `on_best` fires
/// every time the running best score improves, so a caller can stream
/// progress without waiting for the final return.
pub struct Driver {
    planner: Box<dyn Planner>,
    budget: Budget,
    shutdown: Arc<AtomicBool>,
}

impl Driver {
    pub fn new(world: World, strategy: Strategy, initial_path: &[Action], budget: Budget) -> Self {
        let seeded = Plan::new(initial_path.to_vec()).execute(&world);
        Driver {
            planner: build(strategy, seeded),
            budget,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn run(&mut self, mut on_best: impl FnMut(&World)) -> World {
        let mut done = 0u64;
        let mut best_score = self.planner.best().score();
        on_best(self.planner.best());
        loop {
            if self.shutdown.load(Ordering::Relaxed) || self.budget.exhausted(done) {
                break;
            }
            if !self.planner.iterate() {
                break;
            }
            done += 1;
            if self.planner.best().score() > best_score {
                best_score = self.planner.best().score();
                on_best(self.planner.best());
            }
        }
        self.planner.best().clone()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.planner.name()
    }
}

/// the path string the solver reports on stdout. A still-running world gets
/// a synthetic trailing `A` so a grader reading the stream can always submit
/// it as a complete, self-terminating solution; a world that already ended
/// on its own (reached the lift, drowned, was crushed, or was explicitly
/// aborted) is reported exactly as recorded.
pub fn report_path(world: &World) -> String {
    let mut rendered = action::path_string(world.path());
    if world.state().is_running() {
        rendered.push('A');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::reader::read_world;

    #[test]
    fn strategy_parses_named_variants() {
        assert_eq!("weighted".parse::<Strategy>().unwrap(), Strategy::Weighted);
        assert_eq!("tree".parse::<Strategy>().unwrap(), Strategy::Tree);
        assert_eq!("beam:16".parse::<Strategy>().unwrap(), Strategy::Beam(16));
        assert!("nonsense".parse::<Strategy>().is_err());
    }

    #[test]
    fn driver_runs_to_an_iteration_budget_and_reports_improvements() {
        let world = read_world("R.\\..O\n").unwrap();
        let mut driver = Driver::new(world, Strategy::Dive, &[], Budget::iterations(10));
        let mut improvements = 0;
        let result = driver.run(|_| improvements += 1);
        assert!(improvements >= 1);
        assert!(result.score() >= 0);
    }

    #[test]
    fn report_path_appends_trailing_abort_only_while_running() {
        let world = read_world("R O\n").unwrap();
        assert_eq!(report_path(&world), "A");
        let finished = world.step(Action::Right).unwrap();
        assert_eq!(report_path(&finished), "R");
    }

    #[test]
    fn initial_path_seeds_the_search_before_it_starts() {
        let world = read_world("R.\\..O\n").unwrap();
        let driver = Driver::new(world, Strategy::Dive, &[Action::Right], Budget::iterations(0));
        assert_eq!(driver.planner.best().num_moves(), 1);
    }
}
