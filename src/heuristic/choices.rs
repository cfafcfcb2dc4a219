use crate::cave::action::Action;
use crate::cave::grid::Cell;
use crate::cave::grid::Point;
use crate::cave::world::World;
use crate::heuristic::astar;

/// one candidate branch the planner can explore: a path to walk plus a
/// roulette-wheel weight. Mirrors the `(action, weight)` shape a strategy
/// hands to its policy, generalized from a single action to a short plan.
#[derive(Debug, Clone)]
pub struct Choice {
    pub actions: Vec<Action>,
    pub weight: u32,
}

/// how many of the nearest lambdas to consider plans for, before falling
/// back to the lift. Kept small: `step` dominates cost, not the generator.
const NEAREST_LAMBDAS: usize = 4;

/// builds the full set of candidate branches out of `world`: one plan per
/// nearby lambda (weighted by the inverse-distance "goodness" function), a
/// plan to the lift when no lambda plan is reachable, a rock-push branch
/// when a push is immediately available, and a last-resort abort so the
/// generator never returns empty for a running world.
pub fn generate(world: &World) -> Vec<Choice> {
    let mut choices = Vec::new();
    choices.extend(lambda_choices(world));
    choices.extend(lift_choice(world));
    choices.extend(rock_push_choice(world));
    choices.extend(droppable_rock_choice(world));
    choices.extend(shave_choice(world));
    choices.push(abort_choice());
    choices
}

fn goodness(world: &World, path_len: usize) -> u32 {
    let multiplier = 2i64;
    let projected = 25 * multiplier - path_len as i64;
    let divisor = world.num_moves().max(1) as i64;
    let raw = (projected * projected) / divisor;
    raw.clamp(1, u32::MAX as i64) as u32
}

fn lambda_choices(world: &World) -> Vec<Choice> {
    let robot = world.robot();
    let mut lambdas: Vec<Point> = world.lambdas().iter().copied().collect();
    lambdas.sort_by_key(|&p| p.manhattan(robot));
    lambdas
        .into_iter()
        .take(NEAREST_LAMBDAS)
        .filter_map(|target| astar::find_path(world.grid(), robot, target))
        .filter(|path| !path.is_empty())
        .map(|path| {
            let weight = goodness(world, path.len());
            Choice {
                actions: path,
                weight,
            }
        })
        .collect()
}

fn lift_choice(world: &World) -> Option<Choice> {
    if !world.lambdas().is_empty() {
        return None;
    }
    let path = astar::find_path(world.grid(), world.robot(), world.lift())?;
    let weight = goodness(world, path.len());
    Some(Choice {
        actions: path,
        weight,
    })
}

/// a rock sitting directly beside the robot with open space past it is a
/// push worth trying even when it's not on the shortest path to anything.
fn rock_push_choice(world: &World) -> Option<Choice> {
    let robot = world.robot();
    for action in [Action::Left, Action::Right] {
        let (dx, dy) = action.delta();
        let adjacent = robot.offset(dx, dy);
        let beyond = adjacent.offset(dx, dy);
        if world.grid().get(adjacent) == Cell::Rock && world.grid().get(beyond).is_empty() {
            return Some(Choice {
                actions: vec![action],
                weight: goodness(world, 1).max(1),
            });
        }
    }
    None
}

/// a rock sitting two cells above the robot with a clear diagonal is about to
/// slide, per the same fall rule `World::step` applies; routing the robot one
/// step sideways, out from underneath, trades a short detour for not getting
/// crushed next tick.
fn droppable_rock_choice(world: &World) -> Option<Choice> {
    let robot = world.robot();
    let above_two = robot.offset(0, 2);
    if world.grid().get(above_two) != Cell::Rock {
        return None;
    }
    let Point { x, y } = above_two;
    let below_is_open = matches!(world.grid().get(Point::new(x, y - 1)), Cell::Empty | Cell::Lambda);
    let clear_to_roll = |dx: i32| {
        world.grid().get(Point::new(x + dx, y)).is_empty()
            && world.grid().get(Point::new(x + dx, y - 1)).is_empty()
    };
    if !(below_is_open && (clear_to_roll(1) || clear_to_roll(-1))) {
        return None;
    }
    for action in [Action::Left, Action::Right] {
        let (dx, dy) = action.delta();
        let dest = robot.offset(dx, dy);
        if world.grid().get(dest).is_empty() {
            return Some(Choice {
                actions: vec![action],
                weight: goodness(world, 1),
            });
        }
    }
    None
}

/// picking up a razor and immediately shaving back an encroaching beard,
/// when one is already adjacent.
fn shave_choice(world: &World) -> Option<Choice> {
    let robot = world.robot();
    if world.num_razors() > 0 && robot.ring().iter().any(|&n| world.grid().get(n) == Cell::Beard) {
        return Some(Choice {
            actions: vec![Action::Shave],
            weight: goodness(world, 1),
        });
    }
    None
}

fn abort_choice() -> Choice {
    Choice {
        actions: vec![Action::Abort],
        weight: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::reader::read_world;

    #[test]
    fn always_offers_at_least_the_abort_fallback() {
        let w = read_world("R O\n").unwrap();
        let choices = generate(&w);
        assert!(choices.iter().any(|c| c.actions == vec![Action::Abort]));
    }

    #[test]
    fn prefers_the_nearest_lambda_over_a_farther_one() {
        let w = read_world("R.\\...\\O\n").unwrap();
        let choices = lambda_choices(&w);
        let nearest = choices.iter().min_by_key(|c| c.actions.len()).unwrap();
        assert!(nearest.actions.len() <= 2);
    }

    #[test]
    fn offers_a_lift_plan_once_all_lambdas_are_gone() {
        let w = read_world("RO\n").unwrap();
        let choice = lift_choice(&w).unwrap();
        assert_eq!(choice.actions, vec![Action::Right]);
    }

    #[test]
    fn suggests_pushing_an_adjacent_rock_into_open_space() {
        let w = read_world("R* O\n").unwrap();
        let choice = rock_push_choice(&w).unwrap();
        assert_eq!(choice.actions, vec![Action::Right]);
    }

    #[test]
    fn steps_out_from_under_a_rock_poised_to_fall() {
        // rock two above the robot, clear diagonal to the right: about to roll.
        let w = read_world("*  \n   \nR L\n").unwrap();
        let choice = droppable_rock_choice(&w).unwrap();
        assert_eq!(choice.actions, vec![Action::Right]);
    }

    #[test]
    fn no_droppable_rock_choice_when_nothing_is_poised_overhead() {
        let w = read_world("R O\n").unwrap();
        assert!(droppable_rock_choice(&w).is_none());
    }
}
