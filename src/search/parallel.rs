//! Parallel MCTS with pipelined speculative expansion.
//!
//! A single main thread walks the authoritative tree exactly as the
//! sequential algorithm would, while a pool of workers runs ahead of it,
//! expanding and rolling out subtrees the main thread has not reached yet.
//! Every node a worker is assigned keeps a reservation buffer of finished
//! leaves; when the main thread's selection arrives at such a node it pops a
//! pre-expanded successor instead of paying for the expansion itself.
//!
//! Each node carries two statistics bundles: `stats`, written only by the
//! main thread during its own back-propagations, and `spec.stats`, written
//! only by the worker currently assigned to the surrounding subtree. UCT
//! selection uses whichever bundle belongs to the side doing the selecting,
//! so the two sides never contend on the hot path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::eval::NTupleAgent;
use crate::game::{Board, Env, Move};
use crate::search::mcts_core::{best_uct_child, rollout, Stats};
use crate::search::pool::TaskQueue;
use crate::search::{MctsSetting, Reward};

/// Buffer target for chance nodes, capped by their number of spawn
/// outcomes. Decision nodes buffer up to their legal-action count.
const CHANCE_RESERVE: usize = 10;

/// Successors a worker has prepared for the main thread, with the rollout
/// reward of each, plus the task bookkeeping the two sides hand back and
/// forth under the node's mutex.
struct Reserve {
    buffered: VecDeque<(Arc<DecisionNode>, Reward)>,
    pending: Option<Arc<Task>>,
}

/// The speculative half of a node's bookkeeping.
struct Speculation {
    /// True until the main thread adopts the node into the authoritative
    /// tree.
    speculative: AtomicBool,
    /// True while a worker task for this node is queued or running.
    working: AtomicBool,
    /// True while a worker is inside its expansion loop for this node.
    processing: AtomicBool,
    /// Latches true once the node is fully expanded.
    finished: AtomicBool,
    max_reserve: usize,
    /// Statistics of worker back-propagations within the speculative
    /// subtree.
    stats: Mutex<Stats>,
    reserve: Mutex<Reserve>,
    /// Signalled when a leaf is buffered or the worker steps away, for the
    /// main thread waiting in `get_next`.
    cond: Condvar,
}

impl Speculation {
    fn new(speculative: bool, working: bool, max_reserve: usize) -> Self {
        Speculation {
            speculative: AtomicBool::new(speculative),
            working: AtomicBool::new(working),
            processing: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            max_reserve,
            stats: Mutex::new(Stats::default()),
            reserve: Mutex::new(Reserve {
                buffered: VecDeque::new(),
                pending: None,
            }),
            cond: Condvar::new(),
        }
    }
}

pub(crate) struct DecisionNode {
    board: Board,
    cumulate_score: u32,
    game_over: bool,
    parent: Weak<ChanceNode>,
    untried_actions: Mutex<Vec<Move>>,
    children: Mutex<Vec<Arc<ChanceNode>>>,
    /// Authoritative statistics, written only by the main thread.
    stats: Mutex<Stats>,
    spec: Speculation,
}

pub(crate) struct ChanceNode {
    action: Move,
    /// The board after the move, before the tile spawn.
    board: Board,
    cumulate_score: u32,
    max_children: usize,
    parent: Weak<DecisionNode>,
    children: Mutex<Vec<Arc<DecisionNode>>>,
    stats: Mutex<Stats>,
    spec: Speculation,
}

impl DecisionNode {
    fn new(
        env: &mut Env,
        parent: Weak<ChanceNode>,
        board: Board,
        cumulate_score: u32,
        speculative: bool,
        working: bool,
    ) -> Self {
        env.set_board(board);
        let untried: Vec<Move> = env.legal_moves().into_iter().collect();
        let max_reserve = untried.len();
        DecisionNode {
            board,
            cumulate_score,
            game_over: untried.is_empty(),
            parent,
            untried_actions: Mutex::new(untried),
            children: Mutex::new(vec![]),
            stats: Mutex::new(Stats::default()),
            spec: Speculation::new(speculative, working, max_reserve),
        }
    }

    fn fully_expanded(&self) -> bool {
        self.untried_actions.lock().unwrap().is_empty()
    }
}

impl ChanceNode {
    fn new(parent: Weak<DecisionNode>, board: Board, action: Move, cumulate_score: u32) -> Self {
        let max_children = 2 * board.empty_cells().len();
        ChanceNode {
            action,
            board,
            cumulate_score,
            max_children,
            parent,
            children: Mutex::new(vec![]),
            stats: Mutex::new(Stats::default()),
            spec: Speculation::new(true, false, CHANCE_RESERVE.min(max_children)),
        }
    }

    fn fully_expanded(&self) -> bool {
        self.children.lock().unwrap().len() == self.max_children
    }
}

/// A decision or chance node, as tasks and back-propagation see them.
#[derive(Clone)]
pub(crate) enum NodeRef {
    Decision(Arc<DecisionNode>),
    Chance(Arc<ChanceNode>),
}

impl NodeRef {
    fn spec(&self) -> &Speculation {
        match self {
            NodeRef::Decision(node) => &node.spec,
            NodeRef::Chance(node) => &node.spec,
        }
    }

    fn stats(&self) -> &Mutex<Stats> {
        match self {
            NodeRef::Decision(node) => &node.stats,
            NodeRef::Chance(node) => &node.stats,
        }
    }

    fn parent(&self) -> Option<NodeRef> {
        match self {
            NodeRef::Decision(node) => node.parent.upgrade().map(NodeRef::Chance),
            NodeRef::Chance(node) => node.parent.upgrade().map(NodeRef::Decision),
        }
    }

    fn fully_expanded(&self) -> bool {
        match self {
            NodeRef::Decision(node) => node.fully_expanded(),
            NodeRef::Chance(node) => node.fully_expanded(),
        }
    }

    fn same_node(&self, other: &NodeRef) -> bool {
        match (self, other) {
            (NodeRef::Decision(a), NodeRef::Decision(b)) => Arc::ptr_eq(a, b),
            (NodeRef::Chance(a), NodeRef::Chance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// True when this node and all its direct children have been adopted by
    /// the main thread, so no speculative hand-off below it remains.
    fn settled(&self) -> bool {
        if self.spec().speculative.load(Ordering::Acquire) {
            return false;
        }
        match self {
            NodeRef::Decision(node) => node
                .children
                .lock()
                .unwrap()
                .iter()
                .all(|child| !child.spec.speculative.load(Ordering::Acquire)),
            NodeRef::Chance(node) => node
                .children
                .lock()
                .unwrap()
                .iter()
                .all(|child| !child.spec.speculative.load(Ordering::Acquire)),
        }
    }
}

/// A unit of speculative work: extend the reservation buffer of one node.
/// `cancel` is advisory and checked when a worker dequeues the task.
pub(crate) struct Task {
    node: NodeRef,
    cancel: AtomicBool,
}

impl Task {
    fn new(node: NodeRef) -> Self {
        Task {
            node,
            cancel: AtomicBool::new(false),
        }
    }

    fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// A leaf handed to the main thread. `reward` is present when a worker
/// already rolled the leaf out; the degraded synchronous path leaves it for
/// the main thread to compute.
struct Handoff {
    leaf: Arc<DecisionNode>,
    reward: Option<Reward>,
}

/// State shared between the main thread and the worker pool.
struct Engine<'a> {
    agent: &'a NTupleAgent,
    explore: Reward,
    rollout_depth: u16,
    queue: TaskQueue<Task>,
}

impl<'a> Engine<'a> {
    /// Queue a speculative-expansion task for `node`, cancelling whatever
    /// task was pending for it before.
    fn enqueue_task(&self, node: &NodeRef) {
        if node.spec().finished.load(Ordering::Acquire) {
            return;
        }
        let task = Arc::new(Task::new(node.clone()));
        let mut reserve = node.spec().reserve.lock().unwrap();
        if let Some(old) = reserve.pending.replace(task.clone()) {
            old.cancel();
        }
        self.queue.enqueue(task);
    }

    /// If `node` has nothing buffered and its worker is done, retire it from
    /// the pipeline. Caller holds the reserve lock.
    fn stop_working(&self, node: &NodeRef, reserve: &mut Reserve) -> bool {
        if !reserve.buffered.is_empty() || !node.spec().finished.load(Ordering::Acquire) {
            return false;
        }
        if let Some(task) = reserve.pending.take() {
            task.cancel();
        }
        node.spec().working.store(false, Ordering::Release);
        true
    }

    /// Hand the main thread the next successor of a working node.
    ///
    /// Pops from the reservation buffer when possible, waits while a worker
    /// is mid-expansion, and otherwise falls back to expanding synchronously
    /// on the main thread. Returns `None` when the node has nothing left to
    /// offer.
    fn get_next(
        &self,
        env: &mut Env,
        rng: &mut SmallRng,
        node: &NodeRef,
    ) -> Option<Handoff> {
        let spec = node.spec();
        let mut reserve = spec.reserve.lock().unwrap();
        loop {
            if let Some((leaf, reward)) = reserve.buffered.pop_front() {
                leaf.spec.speculative.store(true, Ordering::Release);
                if !self.stop_working(node, &mut reserve)
                    && reserve.pending.is_none()
                    && !spec.processing.load(Ordering::Acquire)
                {
                    drop(reserve);
                    self.enqueue_task(node);
                }
                return Some(Handoff {
                    leaf,
                    reward: Some(reward),
                });
            }
            if spec.processing.load(Ordering::Acquire) {
                // A worker is producing the next leaf right now.
                reserve = spec.cond.wait(reserve).unwrap();
                continue;
            }
            if reserve.pending.is_none() {
                if node.fully_expanded() {
                    spec.finished.store(true, Ordering::Release);
                    spec.working.store(false, Ordering::Release);
                    return None;
                }
                // Nothing buffered, no worker, no queued task: expand here.
                break;
            }
            // The task is still sitting in the queue; reclaim the work.
            if let Some(task) = reserve.pending.take() {
                task.cancel();
            }
            break;
        }
        drop(reserve);

        let leaf = match node {
            NodeRef::Chance(chance) => self.expand_from_chance(env, rng, chance, false),
            NodeRef::Decision(decision) => self.expand_untried(env, rng, decision, false),
        };
        let mut reserve = spec.reserve.lock().unwrap();
        if node.fully_expanded() {
            spec.finished.store(true, Ordering::Release);
        }
        if !self.stop_working(node, &mut reserve) {
            drop(reserve);
            self.enqueue_task(node);
        }
        leaf.map(|leaf| Handoff { leaf, reward: None })
    }

    /// Push the speculative frontier below a node that just stopped
    /// working: mark each child that still has hand-offs to produce as
    /// working and queue a task for it, and recurse past children that are
    /// already settled.
    fn post_next(&self, node: &NodeRef) {
        if node.spec().working.load(Ordering::Acquire) {
            return;
        }
        let children: Vec<NodeRef> = match node {
            NodeRef::Decision(decision) => decision
                .children
                .lock()
                .unwrap()
                .iter()
                .map(|child| NodeRef::Chance(child.clone()))
                .collect(),
            NodeRef::Chance(chance) => chance
                .children
                .lock()
                .unwrap()
                .iter()
                .map(|child| NodeRef::Decision(child.clone()))
                .collect(),
        };
        for child in children {
            let fully_expanded = child.fully_expanded();
            if fully_expanded {
                child.spec().finished.store(true, Ordering::Release);
            }
            let working = !(fully_expanded && child.settled());
            child.spec().working.store(working, Ordering::Release);
            if !fully_expanded {
                self.enqueue_task(&child);
            } else if !working {
                self.post_next(&child);
            }
        }
    }

    /// Expand one untried action of `decision`: create the chance child and
    /// its first spawned decision leaf.
    fn expand_untried(
        &self,
        env: &mut Env,
        rng: &mut SmallRng,
        decision: &Arc<DecisionNode>,
        speculative: bool,
    ) -> Option<Arc<DecisionNode>> {
        let action = {
            let mut untried = decision.untried_actions.lock().unwrap();
            if untried.is_empty() {
                return None;
            }
            let idx = rng.gen_range(0..untried.len());
            untried.swap_remove(idx)
        };
        env.set_board(decision.board);
        env.set_score(0);
        env.slide(action);
        let chance = Arc::new(ChanceNode::new(
            Arc::downgrade(decision),
            *env.board(),
            action,
            decision.cumulate_score + env.score(),
        ));
        decision.children.lock().unwrap().push(chance.clone());

        env.add_random_tile();
        let leaf = Arc::new(DecisionNode::new(
            env,
            Arc::downgrade(&chance),
            *env.board(),
            chance.cumulate_score,
            speculative,
            false,
        ));
        chance.children.lock().unwrap().push(leaf.clone());
        Some(leaf)
    }

    /// Spawn a tile below `chance` and descend, expanding where the
    /// speculative selection bottoms out. Returns the produced leaf, or
    /// `None` when selection dead-ends.
    fn expand_from_chance(
        &self,
        env: &mut Env,
        rng: &mut SmallRng,
        chance: &Arc<ChanceNode>,
        speculative: bool,
    ) -> Option<Arc<DecisionNode>> {
        let (mut cursor, mut expanded) = self.spawn_child(env, chance, speculative);
        while !cursor.game_over && !expanded && cursor.fully_expanded() {
            let next = self.select_chance_child(&cursor, true)?;
            let (node, was_expanded) = self.spawn_child(env, &next, speculative);
            cursor = node;
            expanded = was_expanded;
        }
        if cursor.game_over || expanded {
            return Some(cursor);
        }
        self.expand_untried(env, rng, &cursor, speculative)
    }

    /// Spawn a random tile on `chance`'s board. Descend into the existing
    /// child with that board if there is one, otherwise create it. The
    /// second value is true when a new child was created.
    fn spawn_child(
        &self,
        env: &mut Env,
        chance: &Arc<ChanceNode>,
        speculative: bool,
    ) -> (Arc<DecisionNode>, bool) {
        env.set_board(chance.board);
        env.add_random_tile();
        let spawned = *env.board();
        let mut children = chance.children.lock().unwrap();
        if let Some(child) = children.iter().find(|child| child.board == spawned) {
            return (child.clone(), false);
        }
        let child = Arc::new(DecisionNode::new(
            env,
            Arc::downgrade(chance),
            spawned,
            chance.cumulate_score,
            speculative,
            false,
        ));
        children.push(child.clone());
        (child.clone(), true)
    }

    /// UCT over a decision node's chance children, on the statistics bundle
    /// of whichever side is selecting.
    fn select_chance_child(
        &self,
        decision: &Arc<DecisionNode>,
        speculative_side: bool,
    ) -> Option<Arc<ChanceNode>> {
        let children = decision.children.lock().unwrap();
        let index = if speculative_side {
            let parent = decision.spec.stats.lock().unwrap().clone();
            let child_stats: Vec<Stats> = children
                .iter()
                .map(|child| child.spec.stats.lock().unwrap().clone())
                .collect();
            best_uct_child(&parent, child_stats.iter(), self.explore)?
        } else {
            let parent = decision.stats.lock().unwrap().clone();
            let child_stats: Vec<Stats> = children
                .iter()
                .map(|child| child.stats.lock().unwrap().clone())
                .collect();
            best_uct_child(&parent, child_stats.iter(), self.explore)?
        };
        Some(children[index].clone())
    }

    fn rollout_leaf(&self, env: &mut Env, rng: &mut SmallRng, leaf: &Arc<DecisionNode>) -> Reward {
        rollout(
            env,
            self.agent,
            rng,
            &leaf.board,
            leaf.cumulate_score,
            self.rollout_depth,
        )
    }

    /// Worker-side back-propagation: update the speculative statistics from
    /// `leaf` up to, and excluding, `root`. Authoritative statistics above
    /// the speculative root are never touched from here.
    fn backpropagate_speculative(&self, root: &NodeRef, leaf: &Arc<DecisionNode>, reward: Reward) {
        let mut min_avg = Reward::INFINITY;
        let mut max_avg = Reward::NEG_INFINITY;
        let mut cursor = NodeRef::Decision(leaf.clone());
        while !cursor.same_node(root) {
            cursor
                .spec()
                .stats
                .lock()
                .unwrap()
                .update(reward, &mut min_avg, &mut max_avg);
            match cursor.parent() {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
    }

    /// Run one speculative-expansion task. Fills the node's reservation
    /// buffer up to its target, rolling out and back-propagating each
    /// produced leaf within the speculative subtree. Game-over leaves are
    /// scored but not buffered; they are not viable hand-offs.
    fn run_worker(&self, env: &mut Env, rng: &mut SmallRng, task: &Task) {
        let node = &task.node;
        let spec = node.spec();
        {
            let mut reserve = spec.reserve.lock().unwrap();
            if task.cancelled() || spec.finished.load(Ordering::Acquire) {
                return;
            }
            spec.processing.store(true, Ordering::Release);
            if let Some(pending) = reserve.pending.take() {
                pending.cancel();
            }
        }
        loop {
            {
                let reserve = spec.reserve.lock().unwrap();
                if node.fully_expanded() || reserve.buffered.len() >= spec.max_reserve {
                    break;
                }
            }
            let leaf = match node {
                NodeRef::Chance(chance) => self.expand_from_chance(env, rng, chance, true),
                NodeRef::Decision(decision) => self.expand_untried(env, rng, decision, true),
            };
            let Some(leaf) = leaf else {
                // Nothing can be expanded below this node any more; treat it
                // as exhausted so the main thread retires it.
                spec.finished.store(true, Ordering::Release);
                break;
            };
            let reward = self.rollout_leaf(env, rng, &leaf);
            self.backpropagate_speculative(node, &leaf, reward);
            if leaf.game_over {
                continue;
            }
            let mut reserve = spec.reserve.lock().unwrap();
            reserve.buffered.push_back((leaf, reward));
            spec.cond.notify_one();
        }
        if node.fully_expanded() {
            spec.finished.store(true, Ordering::Release);
        }
        spec.processing.store(false, Ordering::Release);
        let _reserve = spec.reserve.lock().unwrap();
        spec.cond.notify_all();
    }
}

/// Main-thread back-propagation: update the authoritative statistics from
/// `leaf` to the root, adopting every node on the path.
fn backpropagate(leaf: &Arc<DecisionNode>, reward: Reward) {
    let mut min_avg = Reward::INFINITY;
    let mut max_avg = Reward::NEG_INFINITY;
    let mut cursor = Some(NodeRef::Decision(leaf.clone()));
    while let Some(node) = cursor {
        node.stats()
            .lock()
            .unwrap()
            .update(reward, &mut min_avg, &mut max_avg);
        node.spec().speculative.store(false, Ordering::Release);
        cursor = node.parent();
    }
}

/// The main thread's half of the search.
struct MainThread<'e, 'a> {
    engine: &'e Engine<'a>,
    root: Arc<DecisionNode>,
    env: Env,
    rng: SmallRng,
}

/// The outcome of one main-thread selection pass.
struct Selection {
    leaf: Arc<DecisionNode>,
    reward: Option<Reward>,
    /// The boundary node the leaf was obtained through; worker-style
    /// back-propagation for a main-expanded leaf stops here.
    speculative_root: NodeRef,
}

impl<'e, 'a> MainThread<'e, 'a> {
    /// Walk the authoritative subtree from the root down to a hand-off
    /// point, as described at the top of the module.
    fn select_and_expand(&mut self) -> Option<Selection> {
        let engine = self.engine;
        let mut cursor = self.root.clone();
        while !cursor.game_over && !cursor.spec.working.load(Ordering::Acquire) {
            let chance = engine.select_chance_child(&cursor, false)?;
            if chance.spec.working.load(Ordering::Acquire) {
                let node = NodeRef::Chance(chance.clone());
                let handoff = engine.get_next(&mut self.env, &mut self.rng, &node);
                engine.post_next(&node);
                if let Some(handoff) = handoff {
                    return Some(Selection {
                        leaf: handoff.leaf,
                        reward: handoff.reward,
                        speculative_root: node,
                    });
                }
            }
            // An unseen spawn on a non-working node means the pipeline lost
            // a child somewhere; creating it here restores the sequential
            // behaviour.
            let (next, created) = engine.spawn_child(&mut self.env, &chance, false);
            if created {
                return Some(Selection {
                    leaf: next,
                    reward: None,
                    speculative_root: NodeRef::Chance(chance),
                });
            }
            cursor = next;
        }

        if cursor.game_over {
            return Some(Selection {
                leaf: cursor.clone(),
                reward: None,
                speculative_root: NodeRef::Decision(cursor),
            });
        }
        let node = NodeRef::Decision(cursor);
        let handoff = engine.get_next(&mut self.env, &mut self.rng, &node);
        engine.post_next(&node);
        handoff.map(|handoff| Selection {
            leaf: handoff.leaf,
            reward: handoff.reward,
            speculative_root: node,
        })
    }

    /// One search iteration: select a leaf, score it, back-propagate.
    fn run_iteration(&mut self) {
        let Some(selection) = self.select_and_expand() else {
            return;
        };
        let reward = match selection.reward {
            Some(reward) => reward,
            None => {
                // The leaf was expanded on this thread; do the worker's share
                // of the bookkeeping too.
                let reward = self
                    .engine
                    .rollout_leaf(&mut self.env, &mut self.rng, &selection.leaf);
                self.engine.backpropagate_speculative(
                    &selection.speculative_root,
                    &selection.leaf,
                    reward,
                );
                reward
            }
        };
        backpropagate(&selection.leaf, reward);
    }
}

/// The root child with the most authoritative visits.
fn best_action(root: &DecisionNode) -> Option<Move> {
    let children = root.children.lock().unwrap();
    let mut most_visits = 0;
    let mut best = None;
    for child in children.iter() {
        let visits = child.stats.lock().unwrap().visit_count;
        if visits > most_visits {
            most_visits = visits;
            best = Some(child.action);
        }
    }
    best
}

/// Run `iterations` main-thread iterations of pipelined parallel MCTS from
/// `board` and return the most-visited root action. Returns `None` on a
/// terminal board (without starting any worker) and after zero iterations.
pub fn mcts_action_with_settings(
    board: Board,
    agent: &NTupleAgent,
    iterations: u64,
    settings: &MctsSetting,
) -> Option<Move> {
    if board.is_game_over() {
        return None;
    }
    let seed = settings.seed.unwrap_or_else(rand::random);
    let engine = Engine {
        agent,
        explore: settings.exploration_constant,
        rollout_depth: settings.rollout_depth,
        queue: TaskQueue::new(),
    };

    let mut root_env = Env::from_seed(seed);
    let root = Arc::new(DecisionNode::new(
        &mut root_env,
        Weak::new(),
        board,
        0,
        false,
        true,
    ));
    engine.enqueue_task(&NodeRef::Decision(root.clone()));

    thread::scope(|scope| {
        for worker_id in 0..settings.threads.max(1) {
            let engine = &engine;
            scope.spawn(move || {
                let mut env = Env::from_seed(seed.wrapping_add(worker_id as u64 + 1));
                let mut rng = SmallRng::seed_from_u64(seed ^ ((worker_id as u64 + 1) << 32));
                while let Some(task) = engine.queue.next_task() {
                    engine.run_worker(&mut env, &mut rng, &task);
                }
            });
        }

        let mut main = MainThread {
            engine: &engine,
            root: root.clone(),
            env: root_env,
            rng: SmallRng::seed_from_u64(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15)),
        };
        for _ in 0..iterations {
            main.run_iteration();
        }
        engine.queue.stop();
    });

    best_action(&root)
}

/// [`mcts_action_with_settings`] with default settings.
pub fn mcts_action(board: Board, agent: &NTupleAgent, iterations: u64) -> Option<Move> {
    mcts_action_with_settings(board, agent, iterations, &MctsSetting::default())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Hooks for exercising the pipeline internals from the test modules.

    use super::*;

    /// Build a standalone working node with a queued task, as the engine
    /// would before handing it to the pool.
    pub(crate) fn lone_working_node(board: Board) -> (Arc<DecisionNode>, Arc<Task>) {
        let mut env = Env::from_seed(7);
        let node = Arc::new(DecisionNode::new(
            &mut env,
            Weak::new(),
            board,
            0,
            false,
            true,
        ));
        let task = Arc::new(Task::new(NodeRef::Decision(node.clone())));
        (node, task)
    }

    pub(crate) fn cancel_task(task: &Task) {
        task.cancel();
    }

    pub(crate) fn run_worker_on(agent: &NTupleAgent, task: &Task) {
        let engine = Engine {
            agent,
            explore: 1.41,
            rollout_depth: 5,
            queue: TaskQueue::new(),
        };
        let mut env = Env::from_seed(11);
        let mut rng = SmallRng::seed_from_u64(11);
        engine.run_worker(&mut env, &mut rng, task);
    }

    pub(crate) fn child_count(node: &DecisionNode) -> usize {
        node.children.lock().unwrap().len()
    }

    pub(crate) fn buffered_count(node: &DecisionNode) -> usize {
        node.spec.reserve.lock().unwrap().buffered.len()
    }

    pub(crate) fn authoritative_visits(node: &DecisionNode) -> u64 {
        node.stats.lock().unwrap().visit_count
    }
}
