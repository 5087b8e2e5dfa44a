//! Monte Carlo Tree Search over the 2048 environment, guided by the N-tuple
//! estimator.
//!
//! This module contains the public-facing convenience API for the search.
//! The sequential algorithm lives in `mcts_core`; `parallel` adds the
//! speculative worker pipeline on top of it.

use std::thread;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::eval::NTupleAgent;
use crate::game::{Board, Env, Move};

pub mod mcts_core;
pub mod parallel;
pub(crate) mod pool;

pub use parallel::{mcts_action, mcts_action_with_settings};

/// Type alias for back-propagated rewards and value estimates.
pub type Reward = f64;

/// Tunable knobs of the search.
#[derive(Clone, Debug)]
pub struct MctsSetting {
    pub(crate) exploration_constant: Reward,
    pub(crate) rollout_depth: u16,
    pub(crate) threads: usize,
    pub(crate) seed: Option<u64>,
}

impl Default for MctsSetting {
    fn default() -> Self {
        MctsSetting {
            exploration_constant: 1.41,
            rollout_depth: 10,
            threads: thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1),
            seed: None,
        }
    }
}

impl MctsSetting {
    pub fn add_exploration_constant(mut self, exploration_constant: Reward) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    /// The maximum depth of the MCTS rollouts.
    pub fn add_rollout_depth(mut self, rollout_depth: u16) -> Self {
        self.rollout_depth = rollout_depth;
        self
    }

    /// Number of speculative workers for the parallel search.
    pub fn add_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Fix the RNG seed, for reproducible sequential searches.
    pub fn add_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Run sequential MCTS for `iterations` iterations, returning the
/// most-visited root action, or `None` on a terminal board.
pub fn mcts(board: Board, agent: &NTupleAgent, iterations: u64) -> Option<Move> {
    mcts_with_settings(board, agent, iterations, &MctsSetting::default())
}

pub fn mcts_with_settings(
    board: Board,
    agent: &NTupleAgent,
    iterations: u64,
    settings: &MctsSetting,
) -> Option<Move> {
    let seed = settings.seed.unwrap_or_else(rand::random);
    let mut env = Env::from_seed(seed);
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let mut root = mcts_core::DecisionNode::new(&mut env, board, 0);
    for _ in 0..iterations {
        let mut min_avg = Reward::INFINITY;
        let mut max_avg = Reward::NEG_INFINITY;
        root.select(&mut env, agent, settings, &mut rng, &mut min_avg, &mut max_avg);
    }
    mcts_core::best_visit_action(&root)
}
