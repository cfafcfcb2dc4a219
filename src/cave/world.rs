use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::cave::action::Action;
use crate::cave::grid::Cell;
use crate::cave::grid::Grid;
use crate::cave::grid::Point;
use crate::error::EngineError;

/// terminal or in-progress status of a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Running,
    ReachedLift,
    Killed,
    Flooded,
    Aborted,
}

impl State {
    pub fn is_running(self) -> bool {
        matches!(self, State::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }
}

/// A single, deterministic snapshot of the cave. `step` always returns a new
/// `World`; the receiver is never mutated. Cheap to clone: a handful of
/// `Vec`/`BTree*` collections, all small relative to the grid itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    grid: Grid,
    robot: Point,
    lambdas: BTreeSet<Point>,
    rocks: Vec<Point>,
    lift: Point,
    trampolines: BTreeMap<Point, Point>,
    lambdas_collected: u32,
    num_moves: u32,
    water: i32,
    flooding: u32,
    waterproof: u32,
    underwater: u32,
    num_razors: u32,
    beard_growth: u32,
    beards: BTreeSet<Point>,
    state: State,
    path: Vec<Action>,
}

/// fields supplied by the map reader; everything else is derived.
pub struct WorldConfig {
    pub grid: Grid,
    pub water: i32,
    pub flooding: u32,
    pub waterproof: u32,
    pub num_razors: u32,
    pub beard_growth: u32,
    pub trampolines: BTreeMap<Point, Point>,
}

impl World {
    pub(crate) fn from_config(config: WorldConfig) -> Self {
        let grid = config.grid;
        let robot = find_one(&grid, Cell::Robot).expect("reader validated robot presence");
        let lift = find_lift(&grid).expect("reader validated lift presence");
        let lambdas = find_all(&grid, Cell::Lambda);
        let beards = find_all(&grid, Cell::Beard);
        let rocks = sorted_rocks(&grid);
        World {
            grid,
            robot,
            lambdas,
            rocks,
            lift,
            trampolines: config.trampolines,
            lambdas_collected: 0,
            num_moves: 0,
            water: config.water,
            flooding: config.flooding,
            waterproof: config.waterproof,
            underwater: 0,
            num_razors: config.num_razors,
            beard_growth: config.beard_growth,
            beards,
            state: State::Running,
            path: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn robot(&self) -> Point {
        self.robot
    }
    pub fn lambdas(&self) -> &BTreeSet<Point> {
        &self.lambdas
    }
    pub fn rocks(&self) -> &[Point] {
        &self.rocks
    }
    pub fn lift(&self) -> Point {
        self.lift
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn num_moves(&self) -> u32 {
        self.num_moves
    }
    pub fn lambdas_collected(&self) -> u32 {
        self.lambdas_collected
    }
    pub fn num_razors(&self) -> u32 {
        self.num_razors
    }
    pub fn water(&self) -> i32 {
        self.water
    }
    pub fn waterproof(&self) -> u32 {
        self.waterproof
    }
    pub fn beard_growth(&self) -> u32 {
        self.beard_growth
    }
    pub fn path(&self) -> &[Action] {
        &self.path
    }

    /// `25 * lambdas_collected * M - num_moves`, `M` per state per §4.2.
    pub fn score(&self) -> i64 {
        let multiplier: i64 = match self.state {
            State::Killed | State::Flooded => 1,
            State::Aborted | State::Running => 2,
            State::ReachedLift => 3,
        };
        25 * i64::from(self.lambdas_collected) * multiplier - i64::from(self.num_moves)
    }

    /// the legal search frontier: actions that would not fail with `InvalidMove`.
    /// empty once the world is no longer running.
    pub fn valid_moves(&self) -> Vec<Action> {
        if !self.state.is_running() {
            return Vec::new();
        }
        Action::ALL
            .into_iter()
            .filter(|&a| self.is_allowed(a))
            .collect()
    }

    fn is_allowed(&self, action: Action) -> bool {
        match action {
            Action::Wait | Action::Abort | Action::Shave => true,
            Action::Left | Action::Right | Action::Up | Action::Down => {
                let (dx, dy) = action.delta();
                let dest = self.robot.offset(dx, dy);
                match self.grid.get(dest) {
                    Cell::Empty
                    | Cell::Earth
                    | Cell::Lambda
                    | Cell::OpenLift
                    | Cell::Razor
                    | Cell::TrampolineSource(_) => true,
                    Cell::Rock => {
                        action.is_horizontal() && self.grid.get(dest.offset(dx, dy)).is_empty()
                    }
                    Cell::Wall
                    | Cell::ClosedLift
                    | Cell::Beard
                    | Cell::Robot
                    | Cell::TrampolineTarget(_) => false,
                }
            }
        }
    }

    /// applies one tick of the engine. Fails with [`EngineError::GameOver`] if
    /// the world is already terminal, or [`EngineError::InvalidMove`] if the
    /// action is illegal in this state. `self` is left unchanged either way.
    pub fn step(&self, action: Action) -> Result<World, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::GameOver);
        }
        if action == Action::Abort {
            let mut next = self.clone();
            next.state = State::Aborted;
            next.num_moves += 1;
            next.path.push(action);
            return Ok(next);
        }
        if !self.is_allowed(action) {
            return Err(EngineError::InvalidMove(action));
        }

        let mut next = self.clone();
        let in_lift = next.apply_robot_action(action);
        let moved_rocks = next.update_world();
        next.finish_tick(action, in_lift, &moved_rocks);

        debug_assert!(next.check_invariants(self.lambdas.len() + self.lambdas_collected as usize));
        Ok(next)
    }

    /// Phase 1: resolve the robot's own action against the current grid.
    /// Returns whether the robot entered an open lift this tick.
    fn apply_robot_action(&mut self, action: Action) -> bool {
        match action {
            Action::Wait => false,
            Action::Shave => {
                if self.num_razors > 0 {
                    self.num_razors -= 1;
                    for n in self.robot.ring() {
                        if self.grid.get(n) == Cell::Beard {
                            self.grid.set(n, Cell::Empty);
                            self.beards.remove(&n);
                        }
                    }
                }
                false
            }
            Action::Abort => unreachable!("abort short-circuits in step()"),
            Action::Left | Action::Right | Action::Up | Action::Down => {
                let (dx, dy) = action.delta();
                let dest = self.robot.offset(dx, dy);
                let origin = self.robot;
                let cell = self.grid.get(dest);
                let mut in_lift = false;
                match cell {
                    Cell::Empty | Cell::Earth => {}
                    Cell::Lambda => {
                        self.lambdas_collected += 1;
                        self.lambdas.remove(&dest);
                    }
                    Cell::OpenLift => {
                        in_lift = true;
                    }
                    Cell::Razor => {
                        self.num_razors += 1;
                    }
                    Cell::Rock => {
                        let far = dest.offset(dx, dy);
                        self.grid.set(far, Cell::Rock);
                    }
                    Cell::TrampolineSource(_) => {
                        let target = *self
                            .trampolines
                            .get(&dest)
                            .expect("reader paired every trampoline source with a target");
                        let dead_sources: Vec<Point> = self
                            .trampolines
                            .iter()
                            .filter(|(_, t)| **t == target)
                            .map(|(s, _)| *s)
                            .collect();
                        for source in dead_sources {
                            self.grid.set(source, Cell::Empty);
                            self.trampolines.remove(&source);
                        }
                        self.grid.set(origin, Cell::Empty);
                        self.grid.set(target, Cell::Robot);
                        self.robot = target;
                        return false;
                    }
                    Cell::Wall
                    | Cell::ClosedLift
                    | Cell::Beard
                    | Cell::Robot
                    | Cell::TrampolineTarget(_) => {
                        unreachable!("is_allowed rejects {cell:?} destinations")
                    }
                }
                self.grid.set(origin, Cell::Empty);
                self.grid.set(dest, Cell::Robot);
                self.robot = dest;
                in_lift
            }
        }
    }

    /// Phase 2: fall rocks, grow beards, open the lift. Reads the post-Phase-1
    /// grid, writes into a fresh successor grid so no rock within this tick
    /// ever observes another rock's result from the same tick.
    fn update_world(&mut self) -> BTreeSet<Point> {
        let read = self.grid.clone();
        let mut write = read.clone();
        let mut moved = BTreeSet::new();

        for rock in sorted_rocks(&read) {
            let Point { x, y } = rock;
            let below = read.get(Point::new(x, y - 1));
            let right = read.get(Point::new(x + 1, y));
            let left = read.get(Point::new(x - 1, y));
            let rdiag = read.get(Point::new(x + 1, y - 1));
            let ldiag = read.get(Point::new(x - 1, y - 1));

            let target = if below.is_empty() {
                Some(Point::new(x, y - 1))
            } else if below == Cell::Rock && right.is_empty() && rdiag.is_empty() {
                Some(Point::new(x + 1, y - 1))
            } else if below == Cell::Rock
                && !(right.is_empty() && rdiag.is_empty())
                && left.is_empty()
                && ldiag.is_empty()
            {
                Some(Point::new(x - 1, y - 1))
            } else if below == Cell::Lambda && right.is_empty() && rdiag.is_empty() {
                Some(Point::new(x + 1, y - 1))
            } else {
                None
            };

            if let Some(to) = target {
                write.set(rock, Cell::Empty);
                write.set(to, Cell::Rock);
                moved.insert(to);
            }
        }

        if self.beard_growth > 0 && (self.num_moves + 1) % self.beard_growth == 0 {
            let mut grown = Vec::new();
            for beard in &self.beards {
                for n in beard.ring() {
                    if read.get(n).is_empty() {
                        grown.push(n);
                    }
                }
            }
            for n in grown {
                write.set(n, Cell::Beard);
                self.beards.insert(n);
            }
        }

        if read.get(self.lift) == Cell::ClosedLift && self.lambdas.is_empty() {
            write.set(self.lift, Cell::OpenLift);
        }

        self.grid = write;
        self.rocks = sorted_rocks(&self.grid);
        moved
    }

    /// Phase 3: water bookkeeping and terminal-state detection, in the fixed
    /// order the engine contract requires.
    fn finish_tick(&mut self, action: Action, in_lift: bool, moved_rocks: &BTreeSet<Point>) {
        let tick_number = self.num_moves + 1;
        let old_water = self.water;

        self.underwater = if self.robot.y <= old_water {
            self.underwater + 1
        } else {
            0
        };
        if self.flooding > 0 && tick_number % self.flooding == 0 {
            self.water = old_water + 1;
        }

        self.state = if self.underwater > self.waterproof {
            State::Flooded
        } else if moved_rocks.contains(&self.robot.offset(0, 1)) {
            State::Killed
        } else if in_lift {
            State::ReachedLift
        } else {
            State::Running
        };

        self.num_moves += 1;
        self.path.push(action);
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self, initial_lambdas: usize) -> bool {
        let robot_ok = !self.state.is_running() || self.grid.get(self.robot) == Cell::Robot;
        let lambdas_ok = find_all(&self.grid, Cell::Lambda) == self.lambdas;
        let rocks_ok = self.rocks.windows(2).all(|w| (w[0].y, w[0].x) <= (w[1].y, w[1].x))
            && find_all(&self.grid, Cell::Rock) == self.rocks.iter().copied().collect();
        let conservation_ok =
            self.lambdas_collected as usize + self.lambdas.len() == initial_lambdas;
        let underwater_ok = self.robot.y > self.water || self.underwater > 0;
        robot_ok && lambdas_ok && rocks_ok && conservation_ok && underwater_ok
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self, _initial_lambdas: usize) -> bool {
        true
    }
}

fn find_one(grid: &Grid, cell: Cell) -> Option<Point> {
    grid.positions().find(|&p| grid.get(p) == cell)
}

fn find_lift(grid: &Grid) -> Option<Point> {
    grid.positions()
        .find(|&p| matches!(grid.get(p), Cell::ClosedLift | Cell::OpenLift))
}

fn find_all(grid: &Grid, cell: Cell) -> BTreeSet<Point> {
    grid.positions().filter(|&p| grid.get(p) == cell).collect()
}

fn sorted_rocks(grid: &Grid) -> Vec<Point> {
    let mut rocks: Vec<Point> = grid
        .positions()
        .filter(|&p| grid.get(p) == Cell::Rock)
        .collect();
    rocks.sort_by_key(|p| (p.y, p.x));
    rocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::reader::read_world;

    fn world(text: &str) -> World {
        read_world(text).expect("fixture map parses")
    }

    #[test]
    fn corridor_to_lift_scores_seventy_two() {
        let w = world("R.\\O\n");
        let w = w.step(Action::Right).unwrap();
        let w = w.step(Action::Right).unwrap();
        let w = w.step(Action::Right).unwrap();
        assert_eq!(w.state(), State::ReachedLift);
        assert_eq!(w.lambdas_collected(), 1);
        assert_eq!(w.score(), 72);
    }

    #[test]
    fn descending_under_a_rock_kills_the_robot() {
        let w = world("*\nR\n \nL\n");
        let w = w.step(Action::Down).unwrap();
        assert_eq!(w.state(), State::Killed);
        assert_eq!(w.score(), 0);
    }

    #[test]
    fn pushing_a_rock_into_a_wall_is_invalid() {
        let w = world("R* #O\n");
        let w = w.step(Action::Right).unwrap();
        assert_eq!(w.step(Action::Right), Err(EngineError::InvalidMove(Action::Right)));
    }

    #[test]
    fn trampoline_teleports_and_clears_sources_sharing_a_target() {
        let mut text = String::new();
        text.push_str("R A B1 O\n");
        let grid_text = format!("{text}\nTrampoline A targets 1\nTrampoline B targets 1\n");
        let w = world(&grid_text);
        let w = w.step(Action::Right).unwrap();
        let w = w.step(Action::Right).unwrap();
        assert_eq!(w.grid().get(Point::new(2, 0)), Cell::Empty, "source A cleared");
        assert_eq!(w.grid().get(Point::new(4, 0)), Cell::Empty, "source B cleared");
        assert_eq!(w.robot(), Point::new(5, 0));
    }

    #[test]
    fn flooding_and_waterproof_interact_per_scenario() {
        let text = "R O\n\nFlooding 3\nWaterproof 1\n";
        let mut w = world(text);
        for _ in 0..2 {
            w = w.step(Action::Wait).unwrap();
            assert_eq!(w.state(), State::Running);
        }
        w = w.step(Action::Wait).unwrap(); // tick 3: water rises to 0
        assert_eq!(w.water(), 0);
        assert_eq!(w.state(), State::Running);
        w = w.step(Action::Wait).unwrap(); // tick 4: underwater = 1, survives
        assert_eq!(w.state(), State::Running);
        let w = w.step(Action::Wait).unwrap(); // tick 5: underwater = 2 > 1
        assert_eq!(w.state(), State::Flooded);
    }

    #[test]
    fn abort_is_terminal_and_further_steps_are_game_over() {
        let w = world("R O\n");
        let w = w.step(Action::Abort).unwrap();
        assert_eq!(w.state(), State::Aborted);
        assert_eq!(w.step(Action::Wait), Err(EngineError::GameOver));
    }

    #[test]
    fn step_does_not_mutate_the_receiver() {
        let w = world("R.\\O\n");
        let before = w.clone();
        let _ = w.step(Action::Right).unwrap();
        assert_eq!(w, before);
    }

    #[test]
    fn valid_moves_is_empty_once_terminal() {
        let w = world("R O\n").step(Action::Abort).unwrap();
        assert!(w.valid_moves().is_empty());
    }

    #[test]
    fn beard_grows_every_interval() {
        // bottom row (y=0): " W "; top row (y=1): "R O". Beard sits at (1,0)
        // with three empty neighbours in bounds: (0,0), (2,0), (1,1).
        let text = "R O\n W \n\nGrowth 2\n";
        let mut w = world(text);
        assert_eq!(w.grid().get(Point::new(1, 0)), Cell::Beard);
        w = w.step(Action::Wait).unwrap();
        assert_eq!(w.num_moves(), 1);
        assert_eq!(w.grid().get(Point::new(0, 0)), Cell::Empty, "growth hasn't hit yet");
        w = w.step(Action::Wait).unwrap();
        assert_eq!(w.num_moves(), 2);
        assert_eq!(w.grid().get(Point::new(0, 0)), Cell::Beard);
        assert_eq!(w.grid().get(Point::new(2, 0)), Cell::Beard);
        assert_eq!(w.grid().get(Point::new(1, 1)), Cell::Beard);
    }

    #[test]
    fn razor_clears_8_neighbourhood() {
        let text = "WWWL\nWRW \nWWW \n\nRazors 1\n";
        let w = world(text);
        assert_eq!(w.num_razors(), 1);
        let w = w.step(Action::Shave).unwrap();
        assert_eq!(w.num_razors(), 0);
        for p in w.robot().ring() {
            assert_eq!(w.grid().get(p), Cell::Empty, "shave clears every adjacent beard cell");
        }
    }

    #[test]
    fn shave_without_a_razor_is_a_no_op() {
        let w = world("WL\nWR\n");
        let w = w.step(Action::Shave).unwrap();
        assert_eq!(w.grid().get(Point::new(0, 1)), Cell::Beard, "no razor, beard stays put");
    }

    #[test]
    fn lift_opens_only_after_last_lambda_collected() {
        let w = world("R\\L\n");
        assert_eq!(w.grid().get(w.lift()), Cell::ClosedLift);
        let w = w.step(Action::Right).unwrap();
        assert_eq!(w.grid().get(w.lift()), Cell::OpenLift, "opens the tick the last lambda is taken");
    }
}
