//! The sequential core of the MCTS search algorithm, and the statistics
//! bundle shared with the parallel engine.

use rand::Rng;

use crate::eval::NTupleAgent;
use crate::game::{Board, Env, Move};
use crate::search::{MctsSetting, Reward};

/// Visit statistics for one node, including the running reward bounds that
/// normalize the UCT exploration term.
#[derive(Clone, Debug)]
pub struct Stats {
    pub visit_count: u64,
    pub total_reward: Reward,
    pub min_avg: Reward,
    pub max_avg: Reward,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            visit_count: 0,
            total_reward: 0.0,
            min_avg: Reward::INFINITY,
            max_avg: Reward::NEG_INFINITY,
        }
    }
}

impl Stats {
    pub fn avg_reward(&self) -> Reward {
        self.total_reward / self.visit_count as Reward
    }

    /// Record one back-propagated reward. `min_avg`/`max_avg` carry the
    /// bounds seen so far along the path from the leaf; each node merges
    /// them with its own stored bounds and passes the result upward.
    pub fn update(&mut self, reward: Reward, min_avg: &mut Reward, max_avg: &mut Reward) {
        self.visit_count += 1;
        self.total_reward += reward;
        let avg = self.avg_reward();
        *min_avg = min_avg.min(avg).min(self.min_avg);
        self.min_avg = *min_avg;
        *max_avg = max_avg.max(avg).max(self.max_avg);
        self.max_avg = *max_avg;
    }
}

/// The UCT score of a child with statistics `child` under a parent with
/// statistics `parent`. The textbook reward scale is replaced by the
/// parent's observed average-reward range.
pub fn uct_value(parent: &Stats, child: &Stats, explore: Reward) -> Reward {
    child.avg_reward()
        + (parent.max_avg - parent.min_avg)
            * explore
            * ((parent.visit_count as Reward).ln() / child.visit_count as Reward).sqrt()
}

/// Index of the child with the best UCT score, ties to the first one.
/// Unvisited children are skipped; `None` if there is nothing to pick.
pub fn best_uct_child<'a>(
    parent: &Stats,
    children: impl Iterator<Item = &'a Stats>,
    explore: Reward,
) -> Option<usize> {
    let mut best_uct = Reward::NEG_INFINITY;
    let mut best_index = None;
    for (index, child) in children.enumerate() {
        if child.visit_count == 0 {
            continue;
        }
        let uct = uct_value(parent, child, explore);
        if uct > best_uct {
            best_uct = uct;
            best_index = Some(index);
        }
    }
    best_index
}

/// Play up to `depth` uniform random legal moves from `board` and score the
/// endpoint: the accumulated score along the whole line, plus the
/// estimator's value of the final position when the game is still going.
pub fn rollout<R: Rng>(
    env: &mut Env,
    agent: &NTupleAgent,
    rng: &mut R,
    board: &Board,
    cumulate_score: u32,
    depth: u16,
) -> Reward {
    env.set_board(*board);
    env.set_score(0);
    let mut after = *board;
    let mut game_over = env.is_game_over();
    let mut round = 0;
    while !game_over && round < depth {
        let legal = env.legal_moves();
        let result = env.step(legal[rng.gen_range(0..legal.len())]);
        after = result.board;
        game_over = result.game_over;
        round += 1;
    }
    let base = (cumulate_score + env.score()) as Reward;
    if game_over {
        base
    } else {
        base + agent.value(&after)
    }
}

/// A board where the agent is to move.
pub struct DecisionNode {
    pub board: Board,
    pub cumulate_score: u32,
    pub game_over: bool,
    pub untried_actions: Vec<Move>,
    pub children: Vec<ChanceNode>,
    pub stats: Stats,
}

/// The state after a move, before the random tile spawn. One child per
/// distinct spawn outcome observed so far.
pub struct ChanceNode {
    pub action: Move,
    pub board: Board,
    pub cumulate_score: u32,
    pub children: Vec<DecisionNode>,
    pub stats: Stats,
}

impl DecisionNode {
    pub fn new(env: &mut Env, board: Board, cumulate_score: u32) -> Self {
        env.set_board(board);
        let untried_actions: Vec<Move> = env.legal_moves().into_iter().collect();
        DecisionNode {
            board,
            cumulate_score,
            game_over: untried_actions.is_empty(),
            untried_actions,
            children: vec![],
            stats: Stats::default(),
        }
    }

    /// One iteration of MCTS through this node. Selects or expands below,
    /// rolls out at the new leaf, and updates statistics on the unwind.
    pub fn select<R: Rng>(
        &mut self,
        env: &mut Env,
        agent: &NTupleAgent,
        settings: &MctsSetting,
        rng: &mut R,
        min_avg: &mut Reward,
        max_avg: &mut Reward,
    ) -> Reward {
        let reward = if self.game_over {
            self.cumulate_score as Reward
        } else if !self.untried_actions.is_empty() {
            let index = rng.gen_range(0..self.untried_actions.len());
            let action = self.untried_actions.swap_remove(index);
            let mut chance = ChanceNode::expand(env, &self.board, self.cumulate_score, action);
            let reward = chance.expand_leaf(env, agent, settings, rng, min_avg, max_avg);
            chance.stats.update(reward, min_avg, max_avg);
            self.children.push(chance);
            reward
        } else {
            let child_stats = self.children.iter().map(|child| &child.stats);
            match best_uct_child(&self.stats, child_stats, settings.exploration_constant) {
                Some(index) => {
                    self.children[index].select(env, agent, settings, rng, min_avg, max_avg)
                }
                None => return self.cumulate_score as Reward,
            }
        };
        self.stats.update(reward, min_avg, max_avg);
        reward
    }
}

impl ChanceNode {
    /// Apply `action` to `board`, booking the merge reward into the node's
    /// accumulated score. The spawn is left to the selection step.
    #[inline(never)]
    fn expand(env: &mut Env, board: &Board, cumulate_score: u32, action: Move) -> Self {
        env.set_board(*board);
        env.set_score(0);
        env.slide(action);
        ChanceNode {
            action,
            board: *env.board(),
            cumulate_score: cumulate_score + env.score(),
            children: vec![],
            stats: Stats::default(),
        }
    }

    fn select<R: Rng>(
        &mut self,
        env: &mut Env,
        agent: &NTupleAgent,
        settings: &MctsSetting,
        rng: &mut R,
        min_avg: &mut Reward,
        max_avg: &mut Reward,
    ) -> Reward {
        let reward = self.expand_leaf(env, agent, settings, rng, min_avg, max_avg);
        self.stats.update(reward, min_avg, max_avg);
        reward
    }

    /// Spawn a random tile below this node. Descends into the matching child
    /// when the outcome has been seen before, otherwise creates the new
    /// decision leaf and rolls it out.
    fn expand_leaf<R: Rng>(
        &mut self,
        env: &mut Env,
        agent: &NTupleAgent,
        settings: &MctsSetting,
        rng: &mut R,
        min_avg: &mut Reward,
        max_avg: &mut Reward,
    ) -> Reward {
        env.set_board(self.board);
        env.add_random_tile();
        let spawned = *env.board();
        match self.children.iter().position(|child| child.board == spawned) {
            Some(index) => self.children[index].select(env, agent, settings, rng, min_avg, max_avg),
            None => {
                let mut leaf = DecisionNode::new(env, spawned, self.cumulate_score);
                let reward = rollout(
                    env,
                    agent,
                    rng,
                    &leaf.board,
                    leaf.cumulate_score,
                    settings.rollout_depth,
                );
                leaf.stats.update(reward, min_avg, max_avg);
                self.children.push(leaf);
                reward
            }
        }
    }
}

/// The root child with the most visits, `None` if nothing has been visited.
pub fn best_visit_action(root: &DecisionNode) -> Option<Move> {
    let mut most_visits = 0;
    let mut best = None;
    for child in &root.children {
        if child.stats.visit_count > most_visits {
            most_visits = child.stats.visit_count;
            best = Some(child.action);
        }
    }
    best
}
