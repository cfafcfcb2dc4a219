use std::fmt;

use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use petgraph::Direction;

use crate::cave::action;
use crate::cave::action::Action;
use crate::cave::world::World;

/// the mutable payload carried by each tree node. `unexplored` starts as the
/// world's full legal frontier and drains as [`Tree::expand`] visits it.
/// `max_child_score` is a rolling max over this node's own score and every
/// descendant's score discovered so far; `dead_end` is set once every
/// action out of this node leads only to dead-end or dominated subtrees, so
/// a bandit selection never has to re-descend into fully explored territory.
pub struct Data {
    pub world: World,
    pub unexplored: Vec<Action>,
    pub visits: u32,
    pub total_reward: f64,
    pub max_child_score: i64,
    pub dead_end: bool,
}

impl Data {
    fn new(world: World) -> Self {
        let unexplored = world.valid_moves();
        let max_child_score = world.score();
        Data {
            world,
            unexplored,
            visits: 0,
            total_reward: 0.0,
            max_child_score,
            dead_end: false,
        }
    }
}

/// a search tree over [`World`] states. Every [`Tree::expand`] call adds a
/// genuinely new child -- the tree never merges two arrivals into one node --
/// but a side table keyed by board fingerprint tracks which states have been
/// seen before, so a worse (higher move-count) arrival at an already-known
/// layout can be flagged dominated and skipped by the planners rather than
/// explored further.
pub struct Tree {
    graph: DiGraph<Data, Action>,
    cheapest_arrival: std::collections::BTreeMap<Vec<u8>, (u32, NodeIndex)>,
    dominated: std::collections::BTreeSet<NodeIndex>,
}

impl Tree {
    pub fn new(root: World) -> Self {
        let mut graph = DiGraph::new();
        let fingerprint = root.grid().fingerprint();
        let moves = root.num_moves();
        let index = graph.add_node(Data::new(root));
        let mut cheapest_arrival = std::collections::BTreeMap::new();
        cheapest_arrival.insert(fingerprint, (moves, index));
        Tree {
            graph,
            cheapest_arrival,
            dominated: std::collections::BTreeSet::new(),
        }
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            index: NodeIndex::new(0),
            tree: self,
        }
    }

    pub fn get(&self, index: NodeIndex) -> Node<'_> {
        Node { index, tree: self }
    }

    /// takes one unexplored action off `index`, walks it, and adds the
    /// result as a new child. If the child's layout has been reached before
    /// by a cheaper path, the child is marked dominated; if the child is the
    /// first or cheapest arrival at its layout, the previously cheapest node
    /// at that layout -- and everything already explored beneath it -- is
    /// marked dominated in its favour.
    pub fn expand(&mut self, index: NodeIndex, action: Action) -> NodeIndex {
        let world = &self.graph[index].world;
        let child_world = world
            .step(action)
            .expect("action drawn from this node's own valid_moves");
        self.graph[index].unexplored.retain(|&a| a != action);

        let fingerprint = child_world.grid().fingerprint();
        let child_moves = child_world.num_moves();
        let child = self.graph.add_node(Data::new(child_world));
        self.graph.add_edge(index, child, action);

        match self.cheapest_arrival.get(&fingerprint).copied() {
            Some((best_moves, _)) if child_moves >= best_moves => {
                self.mark_dominated_subtree(child);
            }
            Some((_, best_index)) => {
                let stale_parent = self.parent_of(best_index);
                self.mark_dominated_subtree(best_index);
                self.dominated.remove(&child);
                self.cheapest_arrival
                    .insert(fingerprint, (child_moves, child));
                if let Some(parent) = stale_parent {
                    self.recompute_dead_end(parent);
                }
            }
            None => {
                self.cheapest_arrival
                    .insert(fingerprint, (child_moves, child));
            }
        }

        self.recompute_dead_end(child);
        self.recompute_dead_end(index);
        child
    }

    /// marks `index` and every node already reachable beneath it (per its
    /// child table) dominated -- §4.5/§9's "mark the prior and its
    /// descendants dominated by walking their child tables".
    fn mark_dominated_subtree(&mut self, index: NodeIndex) {
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if self.dominated.insert(i) {
                stack.extend(self.graph.neighbors_directed(i, Direction::Outgoing));
            }
        }
    }

    fn parent_of(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// a node is a dead end once it has no unexplored action left and every
    /// child is itself a dead end or dominated -- §4.5's "a node all of
    /// whose children are dead-end becomes dead-end; propagate upward".
    /// Terminal leaves (no unexplored actions, no children at all) become
    /// dead ends immediately, since "every child" holds vacuously.
    fn recompute_dead_end(&mut self, index: NodeIndex) {
        if self.graph[index].dead_end || !self.graph[index].unexplored.is_empty() {
            return;
        }
        let all_exhausted = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .all(|child| self.graph[child].dead_end || self.dominated.contains(&child));
        if !all_exhausted {
            return;
        }
        self.graph[index].dead_end = true;
        if let Some(parent) = self.parent_of(index) {
            self.recompute_dead_end(parent);
        }
    }

    pub fn backpropagate(&mut self, mut index: NodeIndex, reward: f64) {
        loop {
            let data = &mut self.graph[index];
            data.visits += 1;
            data.total_reward += reward;
            match self
                .graph
                .neighbors_directed(index, Direction::Incoming)
                .next()
            {
                Some(parent) => index = parent,
                None => break,
            }
        }
    }

    /// walks the parent chain from `index` up to the root, raising
    /// `max_child_score` wherever `score` improves on it -- §4.4/§4.5's
    /// "rolling max-child-score", updated "on new-best". Stops as soon as
    /// an ancestor's recorded max already covers `score`, since every node
    /// further up the chain is already consistent with it.
    pub fn update_best(&mut self, mut index: NodeIndex, score: i64) {
        loop {
            let data = &mut self.graph[index];
            if score <= data.max_child_score {
                break;
            }
            data.max_child_score = score;
            match self.parent_of(index) {
                Some(parent) => index = parent,
                None => break,
            }
        }
    }

    pub fn is_dominated(&self, index: NodeIndex) -> bool {
        self.dominated.contains(&index)
    }

    /// the leaf with the highest score anywhere in the tree, skipping
    /// branches marked dominated.
    pub fn best_leaf(&self) -> Node<'_> {
        self.graph
            .node_indices()
            .filter(|i| !self.dominated.contains(i))
            .max_by_key(|&i| self.graph[i].world.score())
            .map(|index| Node { index, tree: self })
            .unwrap_or_else(|| self.root())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// drops the bookkeeping entries for nodes that are both dominated and
    /// fully explored, so long-running searches don't carry dead frontier
    /// forever. The nodes themselves stay in the graph -- only future
    /// candidate-selection passes need to skip them, which `is_dominated`
    /// already does in O(1).
    pub fn compact(&mut self) {
        self.cheapest_arrival
            .retain(|_, &mut (_, index)| !self.dominated.contains(&index));
    }
}

/// a thin, copyable read-only view over one tree node. Mutation goes through
/// [`Tree`] directly; this type only ever borrows it.
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    index: NodeIndex,
    tree: &'tree Tree,
}

impl<'tree> Node<'tree> {
    pub fn index(self) -> NodeIndex {
        self.index
    }

    pub fn world(self) -> &'tree World {
        &self.tree.graph[self.index].world
    }

    pub fn unexplored(self) -> &'tree [Action] {
        &self.tree.graph[self.index].unexplored
    }

    pub fn visits(self) -> u32 {
        self.tree.graph[self.index].visits
    }

    pub fn total_reward(self) -> f64 {
        self.tree.graph[self.index].total_reward
    }

    pub fn is_dominated(self) -> bool {
        self.tree.is_dominated(self.index)
    }

    pub fn is_dead_end(self) -> bool {
        self.tree.graph[self.index].dead_end
    }

    pub fn max_child_score(self) -> i64 {
        self.tree.graph[self.index].max_child_score
    }

    pub fn parent(self) -> Option<Node<'tree>> {
        self.tree
            .graph
            .neighbors_directed(self.index, Direction::Incoming)
            .next()
            .map(|index| Node {
                index,
                tree: self.tree,
            })
    }

    pub fn children(self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        let tree = self.tree;
        tree.graph
            .neighbors_directed(self.index, Direction::Outgoing)
            .map(move |index| Node { index, tree })
    }

    /// the sequence of actions from the tree root down to this node, read
    /// off the edge labels, not stored per-node.
    pub fn history(self) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut current = self.index;
        while let Some(edge) = self
            .tree
            .graph
            .edges_directed(current, Direction::Incoming)
            .next()
        {
            actions.push(*edge.weight());
            current = edge.source();
        }
        actions.reverse();
        actions
    }

    /// recursive `pprint`-style rendering: one indented line per node, its
    /// history, score, and terminal/dead-end/dominated flags, followed by
    /// every child at the next indent level.
    fn pprint(self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}[{}] {}{}{}",
            "",
            action::path_string(&self.history()),
            self.world().score(),
            if self.world().state().is_terminal() { " DONE" } else { "" },
            if self.is_dead_end() { " DEAD" } else if self.is_dominated() { " DOMINATED" } else { "" },
            indent = indent,
        )?;
        for child in self.children() {
            child.pprint(f, indent + 2)?;
        }
        Ok(())
    }
}

/// recursively pretty-prints the subtree rooted at this node, the way
/// `lifter_tree.py`/`lifter_uct.py`'s `Node.pprint` walks `child_nodes`.
impl<'tree> fmt::Display for Node<'tree> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.pprint(f, 0)
    }
}

impl<'tree> fmt::Debug for Node<'tree> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("history", &action::path_string(&self.history()))
            .field("score", &self.world().score())
            .field("visits", &self.visits())
            .field("total_reward", &self.total_reward())
            .field("max_child_score", &self.max_child_score())
            .field("dead_end", &self.is_dead_end())
            .field("dominated", &self.is_dominated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cave::reader::read_world;

    #[test]
    fn expand_grows_the_tree_and_records_history() {
        let world = read_world("R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();
        let child = tree.expand(root, Action::Right);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(child).history(), vec![Action::Right]);
    }

    #[test]
    fn a_longer_arrival_at_a_known_layout_is_marked_dominated() {
        let world = read_world(" R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();

        let direct = tree.expand(root, Action::Right);
        let detour_a = tree.expand(root, Action::Left);
        let detour_b = tree.expand(detour_a, Action::Right);
        let detour_c = tree.expand(detour_b, Action::Right);

        assert_eq!(tree.get(direct).world().robot(), tree.get(detour_c).world().robot());
        assert!(!tree.is_dominated(direct));
        assert!(tree.is_dominated(detour_c));
    }

    #[test]
    fn backpropagate_updates_every_ancestor() {
        let world = read_world("R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();
        let child = tree.expand(root, Action::Right);
        tree.backpropagate(child, 5.0);
        assert_eq!(tree.get(child).visits(), 1);
        assert_eq!(tree.root().visits(), 1);
        assert_eq!(tree.root().total_reward(), 5.0);
    }

    #[test]
    fn superseding_a_cheapest_arrival_also_dominates_its_already_expanded_descendants() {
        let world = read_world(".....\n R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();

        // an expensive detour reaches x=2 in 3 moves and becomes the
        // (temporary) cheapest arrival at that layout, since it's the first
        // time the tree sees it.
        let detour_a = tree.expand(root, Action::Left);
        let detour_b = tree.expand(detour_a, Action::Right);
        let detour_c = tree.expand(detour_b, Action::Right);
        assert!(!tree.is_dominated(detour_c));

        // give the detour a child of its own before it gets superseded.
        let detour_child = tree.expand(detour_c, Action::Up);
        assert!(!tree.is_dominated(detour_child));

        // a direct, single-move arrival at the same layout supersedes it.
        let direct = tree.expand(root, Action::Right);
        assert_eq!(tree.get(direct).world().robot(), tree.get(detour_c).world().robot());

        assert!(!tree.is_dominated(direct));
        assert!(tree.is_dominated(detour_c), "superseded node must be dominated");
        assert!(
            tree.is_dominated(detour_child),
            "a dominated node's already-expanded descendants must be walked and dominated too"
        );
    }

    #[test]
    fn root_becomes_a_dead_end_once_every_action_is_exhausted_or_dominated() {
        let world = read_world("RO\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();

        tree.expand(root, Action::Right);
        tree.expand(root, Action::Wait);
        tree.expand(root, Action::Abort);
        tree.expand(root, Action::Shave);

        assert!(tree.root().unexplored().is_empty());
        assert!(tree.root().is_dead_end());
    }

    #[test]
    fn update_best_raises_max_child_score_up_the_parent_chain() {
        let world = read_world("R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();
        let child = tree.expand(root, Action::Right);
        let grandchild = tree.expand(child, Action::Right);

        let raised = tree.root().max_child_score() + 1000;
        tree.update_best(grandchild, raised);

        assert_eq!(tree.get(grandchild).max_child_score(), raised);
        assert_eq!(tree.get(child).max_child_score(), raised);
        assert_eq!(tree.root().max_child_score(), raised);
    }

    #[test]
    fn update_best_never_lowers_an_already_recorded_max() {
        let world = read_world("R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();
        let child = tree.expand(root, Action::Right);

        tree.update_best(child, 1_000_000);
        let raised = tree.root().max_child_score();
        tree.update_best(child, -999);

        assert_eq!(tree.root().max_child_score(), raised);
    }

    #[test]
    fn display_pretty_prints_the_subtree_recursively() {
        let world = read_world("R..O\n").unwrap();
        let mut tree = Tree::new(world);
        let root = tree.root().index();
        tree.expand(root, Action::Right);

        let rendered = tree.root().to_string();
        assert!(rendered.lines().count() >= 2, "root line plus at least one child line");
        assert!(rendered.contains('['));
    }

    #[test]
    fn debug_includes_the_dead_end_and_dominated_flags() {
        let world = read_world("R..O\n").unwrap();
        let tree = Tree::new(world);
        let rendered = format!("{:?}", tree.root());
        assert!(rendered.contains("dead_end"));
        assert!(rendered.contains("dominated"));
    }
}
