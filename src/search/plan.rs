use crate::cave::action::Action;
use crate::cave::world::World;

/// an action sequence paired with the world it was proposed against. Cheap
/// to construct, and only ever walked when something needs its resulting
/// world -- a planner can hold thousands of these without stepping any of
/// them until one is actually selected.
#[derive(Debug, Clone)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Plan { actions }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// replays the plan against `world`, stopping early if a step becomes
    /// invalid or the world turns terminal -- the result reflects however
    /// much of the plan actually applied, never a partial error.
    pub fn execute(&self, world: &World) -> World {
        let mut current = world.clone();
        for &action in &self.actions {
            if current.state().is_terminal() {
                break;
            }
            match current.step(action) {
                Ok(next) => current = next,
                Err(_) => break,
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::reader::read_world;

    #[test]
    fn executes_a_full_plan_to_the_lift() {
        let world = read_world("R..O\n").unwrap();
        let plan = Plan::new(vec![Action::Right, Action::Right, Action::Right]);
        let result = plan.execute(&world);
        assert_eq!(result.num_moves(), 3);
    }

    #[test]
    fn stops_early_on_an_invalid_step_without_erroring() {
        let world = read_world("R# O\n").unwrap();
        let plan = Plan::new(vec![Action::Right, Action::Right, Action::Right]);
        let result = plan.execute(&world);
        assert_eq!(result.num_moves(), 0);
    }

    #[test]
    fn stops_once_terminal() {
        let world = read_world("R O\n").unwrap();
        let plan = Plan::new(vec![Action::Abort, Action::Right]);
        let result = plan.execute(&world);
        assert_eq!(result.num_moves(), 1);
    }
}
