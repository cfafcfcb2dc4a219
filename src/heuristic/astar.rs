use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

use crate::cave::action::Action;
use crate::cave::grid::Cell;
use crate::cave::grid::Grid;
use crate::cave::grid::Point;

/// terrain weight for stepping onto `cell`, or `None` if it can never be
/// entered by a walking search (as opposed to [`crate::cave::world::World`]'s
/// stricter per-tick legality, which additionally allows rock pushes).
fn terrain_cost(cell: Cell) -> Option<u32> {
    match cell {
        Cell::Wall
        | Cell::Rock
        | Cell::ClosedLift
        | Cell::Beard
        | Cell::TrampolineTarget(_) => None,
        Cell::Lambda => Some(0),
        Cell::Empty => Some(2),
        Cell::Earth => Some(4),
        Cell::OpenLift | Cell::Razor | Cell::TrampolineSource(_) | Cell::Robot => Some(5),
    }
}

/// a rock sitting two cells above a candidate destination can fall onto it
/// next tick; the pathfinder treats that destination as impassable rather
/// than let a plan walk the robot under a falling rock.
fn unsafe_to_enter(grid: &Grid, dest: Point) -> bool {
    grid.get(dest.offset(0, 2)) == Cell::Rock
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Frontier {
    estimate: u32,
    cost: u32,
    point: Point,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 4-connected A* from `start` to `goal` over terrain weights, with an
/// anti-crush safety margin. Returns the shortest action sequence, or `None`
/// if `goal` is unreachable.
pub fn find_path(grid: &Grid, start: Point, goal: Point) -> Option<Vec<Action>> {
    if start == goal {
        return Some(Vec::new());
    }

    let moves = [Action::Left, Action::Right, Action::Up, Action::Down];
    let mut open = BinaryHeap::new();
    let mut best_cost: HashMap<Point, u32> = HashMap::new();
    let mut came_from: HashMap<Point, (Point, Action)> = HashMap::new();

    best_cost.insert(start, 0);
    open.push(Frontier {
        estimate: start.manhattan(goal),
        cost: 0,
        point: start,
    });

    while let Some(Frontier { cost, point, .. }) = open.pop() {
        if point == goal {
            return Some(reconstruct(&came_from, goal));
        }
        if cost > *best_cost.get(&point).unwrap_or(&u32::MAX) {
            continue;
        }
        for action in moves {
            let (dx, dy) = action.delta();
            let next = point.offset(dx, dy);
            if action == Action::Down && unsafe_to_enter(grid, next) {
                continue;
            }
            let Some(step_cost) = terrain_cost(grid.get(next)).filter(|_| next == goal || grid.get(next) != Cell::Robot)
            else {
                continue;
            };
            let next_cost = cost + step_cost;
            if next_cost < *best_cost.get(&next).unwrap_or(&u32::MAX) {
                best_cost.insert(next, next_cost);
                came_from.insert(next, (point, action));
                open.push(Frontier {
                    estimate: next_cost + next.manhattan(goal),
                    cost: next_cost,
                    point: next,
                });
            }
        }
    }
    None
}

fn reconstruct(came_from: &HashMap<Point, (Point, Action)>, goal: Point) -> Vec<Action> {
    let mut actions = Vec::new();
    let mut current = goal;
    while let Some(&(prev, action)) = came_from.get(&current) {
        actions.push(action);
        current = prev;
    }
    actions.reverse();
    actions
}
