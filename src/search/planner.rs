use petgraph::graph::NodeIndex;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::cave::world::World;
use crate::heuristic::choices;
use crate::search::node::Tree;
use crate::search::plan::Plan;

/// one step of whatever search strategy is driving the exploration. `iterate`
/// does a fixed, bounded amount of work and reports whether there was
/// anything left to do; `best` is cheap and can be polled after every call
/// to report an improving-but-not-yet-final running score.
pub trait Planner {
    fn iterate(&mut self) -> bool;
    fn best(&self) -> &World;
    fn name(&self) -> &'static str;
}

/// roulette-wheel strategy: at each step, weigh the candidate plans the
/// heuristic layer proposes and walk one at random, proportional to weight.
/// No tree, no dominance bookkeeping -- just a running current-best world,
/// the way `strategy/policy.rs`'s flat `Policy::choose` works for a single
/// action.
pub struct WeightedPlanner {
    current: World,
    best: World,
    rng: SmallRng,
}

impl WeightedPlanner {
    pub fn new(world: World) -> Self {
        WeightedPlanner {
            current: world.clone(),
            best: world,
            rng: SmallRng::from_os_rng(),
        }
    }

    fn choose(&mut self, candidates: &[choices::Choice]) -> usize {
        let total: u32 = candidates.iter().map(|c| c.weight).sum();
        let mut pick = self.rng.random_range(0..total.max(1));
        for (i, choice) in candidates.iter().enumerate() {
            if pick < choice.weight {
                return i;
            }
            pick = pick.saturating_sub(choice.weight);
        }
        candidates.len() - 1
    }
}

impl Planner for WeightedPlanner {
    fn iterate(&mut self) -> bool {
        if self.current.state().is_terminal() {
            return false;
        }
        let candidates = choices::generate(&self.current);
        if candidates.is_empty() {
            return false;
        }
        let pick = self.choose(&candidates);
        let plan = Plan::new(candidates[pick].actions.clone());
        self.current = plan.execute(&self.current);
        if self.current.score() > self.best.score() {
            self.best = self.current.clone();
        }
        true
    }

    fn best(&self) -> &World {
        &self.best
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// best-first tree search with dominance pruning: always expand the highest
/// scoring non-dominated node that still has unexplored actions.
pub struct TreePlanner {
    tree: Tree,
    frontier: Vec<NodeIndex>,
}

impl TreePlanner {
    pub fn new(world: World) -> Self {
        let tree = Tree::new(world);
        let root = tree.root().index();
        TreePlanner {
            tree,
            frontier: vec![root],
        }
    }
}

impl Planner for TreePlanner {
    fn iterate(&mut self) -> bool {
        self.frontier
            .retain(|&i| !self.tree.is_dominated(i) && !self.tree.get(i).is_dead_end());
        let Some(position) = self
            .frontier
            .iter()
            .enumerate()
            .filter(|(_, &i)| !self.tree.get(i).unexplored().is_empty())
            .max_by_key(|(_, &i)| self.tree.get(i).world().score())
            .map(|(position, _)| position)
        else {
            return false;
        };
        let parent = self.frontier[position];
        let action = self.tree.get(parent).unexplored()[0];
        let child = self.tree.expand(parent, action);
        self.tree.update_best(child, self.tree.get(child).world().score());

        if self.tree.get(parent).unexplored().is_empty() {
            self.frontier.remove(position);
        }
        if self.tree.get(child).world().state().is_running() {
            self.frontier.push(child);
        }
        if self.frontier.len() > 4096 {
            self.tree.compact();
        }
        true
    }

    fn best(&self) -> &World {
        self.tree.best_leaf().world()
    }

    fn name(&self) -> &'static str {
        "tree"
    }
}

const UCB1_EXPLORATION: f64 = std::f64::consts::SQRT_2;
const ROLLOUT_DEPTH: usize = 20;

fn ucb1(parent_visits: u32, child_visits: u32, total_reward: f64) -> f64 {
    if child_visits == 0 {
        return f64::INFINITY;
    }
    let mean = total_reward / f64::from(child_visits);
    let exploration =
        UCB1_EXPLORATION * ((parent_visits as f64).ln() / f64::from(child_visits)).sqrt();
    mean + exploration
}

/// upper-confidence-bound Monte Carlo tree search: descend by UCB1 while
/// every node on the path is fully expanded, expand the first node that
/// isn't, roll out randomly to a depth cap, and backpropagate the rollout's
/// score the whole way back up.
pub struct Ucb1Planner {
    tree: Tree,
    rng: SmallRng,
    best: World,
}

impl Ucb1Planner {
    pub fn new(world: World) -> Self {
        Ucb1Planner {
            best: world.clone(),
            tree: Tree::new(world),
            rng: SmallRng::from_os_rng(),
        }
    }

    fn select(&self) -> NodeIndex {
        let mut current = self.tree.root().index();
        loop {
            let node = self.tree.get(current);
            if !node.unexplored().is_empty() || node.world().state().is_terminal() {
                return current;
            }
            let parent_visits = node.visits();
            let next = node
                .children()
                .filter(|c| !c.is_dominated() && !c.is_dead_end())
                .max_by(|a, b| {
                    let sa = ucb1(parent_visits, a.visits(), a.total_reward());
                    let sb = ucb1(parent_visits, b.visits(), b.total_reward());
                    sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
                });
            match next {
                Some(child) => current = child.index(),
                None => return current,
            }
        }
    }

    fn rollout(&mut self, world: &World) -> World {
        let mut current = world.clone();
        for _ in 0..ROLLOUT_DEPTH {
            if current.state().is_terminal() {
                break;
            }
            let moves = current.valid_moves();
            if moves.is_empty() {
                break;
            }
            let pick = self.rng.random_range(0..moves.len());
            current = current.step(moves[pick]).expect("drawn from valid_moves");
        }
        current
    }
}

impl Planner for Ucb1Planner {
    fn iterate(&mut self) -> bool {
        if self.tree.root().is_dead_end() {
            return false;
        }
        let selected = self.select();
        let terminal_leaf = {
            let node = self.tree.get(selected);
            node.world().state().is_terminal() && node.unexplored().is_empty()
        };
        if terminal_leaf {
            let score = self.tree.get(selected).world().score();
            self.tree.backpropagate(selected, score as f64);
            self.tree.update_best(selected, score);
            return true;
        }

        let action = self.tree.get(selected).unexplored()[0];
        let child = self.tree.expand(selected, action);
        let child_world = self.tree.get(child).world().clone();
        let rollout_result = self.rollout(&child_world);
        let reward = rollout_result.score() as f64;
        self.tree.backpropagate(child, reward);
        self.tree.update_best(child, rollout_result.score());

        if rollout_result.score() > self.best.score() {
            self.best = rollout_result;
        }
        true
    }

    fn best(&self) -> &World {
        &self.best
    }

    fn name(&self) -> &'static str {
        "ucb1"
    }
}

/// keeps the `width` highest-scoring candidate worlds at each step and
/// expands every one of them before trimming back down to `width`. `width ==
/// 1` degenerates into a greedy dive.
pub struct BeamPlanner {
    width: usize,
    frontier: Vec<World>,
    best: World,
}

impl BeamPlanner {
    pub fn new(world: World, width: usize) -> Self {
        BeamPlanner {
            width: width.max(1),
            frontier: vec![world.clone()],
            best: world,
        }
    }

    pub fn dive(world: World) -> Self {
        BeamPlanner::new(world, 1)
    }
}

impl Planner for BeamPlanner {
    fn iterate(&mut self) -> bool {
        let mut next_frontier = Vec::new();
        let mut progressed = false;
        for world in &self.frontier {
            if world.state().is_terminal() {
                next_frontier.push(world.clone());
                continue;
            }
            for choice in choices::generate(world) {
                let plan = Plan::new(choice.actions);
                let result = plan.execute(world);
                if result.num_moves() > world.num_moves() {
                    progressed = true;
                }
                next_frontier.push(result);
            }
        }
        if !progressed {
            return false;
        }
        next_frontier.sort_by_key(|w| std::cmp::Reverse(w.score()));
        next_frontier.dedup_by_key(|w| w.grid().fingerprint());
        next_frontier.truncate(self.width);
        self.frontier = next_frontier;

        if let Some(top) = self.frontier.first() {
            if top.score() > self.best.score() {
                self.best = top.clone();
            }
        }
        true
    }

    fn best(&self) -> &World {
        &self.best
    }

    fn name(&self) -> &'static str {
        "beam"
    }
}
