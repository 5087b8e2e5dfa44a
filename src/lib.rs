//! A 2048 agent combining an N-tuple value estimator, trained by
//! temporal-difference learning over afterstates, with a parallel Monte
//! Carlo Tree Search that speculatively expands the tree on worker threads.
//!
//! # Examples
//!
//! Play one move with the parallel search:
//!
//! ```rust,no_run
//! use twenty48::eval::{default_patterns, NTupleAgent};
//! use twenty48::game::Env;
//! use twenty48::search::mcts_action;
//!
//! let agent = NTupleAgent::new(default_patterns());
//! let mut env = Env::new();
//! env.reset();
//! while let Some(mv) = mcts_action(*env.board(), &agent, 500) {
//!     env.step(mv);
//! }
//! println!("Final score: {}", env.score());
//! ```
//!
//! Train the estimator from scratch:
//!
//! ```rust,no_run
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//! use twenty48::eval::{default_patterns, EpsilonSchedule, NTupleAgent};
//! use twenty48::game::Env;
//!
//! let mut agent = NTupleAgent::new(default_patterns()).with_init_value(160_000.0);
//! let mut env = Env::new();
//! let mut rng = SmallRng::from_entropy();
//! let scores = agent.train(&mut env, 10_000, EpsilonSchedule::constant(0.1), &mut rng);
//! println!("Last score: {}", scores.last().unwrap());
//! ```

pub mod eval;
pub mod game;
pub mod search;
mod tests;

pub use search::{mcts, mcts_action};
