//! N-tuple value estimator trained with TD(0) over afterstates.
//!
//! The agent keeps one weight table per *base* pattern; all 8 symmetric
//! variants of a pattern read and update that same table, so a single board
//! can reinforce the same key several times in one pass. Trained weight
//! files depend on this sharing, and so does the scale of `value`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::io::{BufRead, Write};
use std::path::Path;

use arrayvec::ArrayVec;
use log::{info, warn};
use rand::Rng;

use crate::eval::pattern::{Pattern, MAX_TUPLE};
use crate::game::{Board, Env, Move};

/// The tile log-indices read from one symmetric pattern.
type Feature = ArrayVec<u8, MAX_TUPLE>;

type WeightTable = HashMap<Feature, f64>;

/// One afterstate transition, as recorded by [`NTupleAgent::train`].
#[derive(Clone, Copy, Debug)]
pub struct Experience {
    pub beforestate: Board,
    pub action: Move,
    pub reward: u32,
    pub afterstate: Board,
    pub done: bool,
}

/// Linearly decaying exploration rate for training.
#[derive(Clone, Copy, Debug)]
pub struct EpsilonSchedule {
    pub start: f64,
    pub end: f64,
    pub decay_episodes: u64,
}

impl EpsilonSchedule {
    pub fn constant(epsilon: f64) -> Self {
        EpsilonSchedule {
            start: epsilon,
            end: epsilon,
            decay_episodes: 1,
        }
    }

    pub fn value_at(&self, episode: u64) -> f64 {
        if episode >= self.decay_episodes {
            return self.end;
        }
        let progress = episode as f64 / self.decay_episodes as f64;
        self.start + (self.end - self.start) * progress
    }
}

pub struct NTupleAgent {
    patterns: Vec<Pattern>,
    symmetric_patterns: Vec<Pattern>,
    weights: Vec<WeightTable>,
    learning_rate: f64,
    discount_factor: f64,
    init_value: f64,
}

fn tile_to_index(tile: u32) -> u8 {
    if tile == 0 {
        0
    } else {
        tile.ilog2() as u8
    }
}

fn feature(board: &Board, pattern: &Pattern) -> Feature {
    pattern
        .coords()
        .iter()
        .map(|&(y, x)| tile_to_index(board[(y, x)]))
        .collect()
}

impl NTupleAgent {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        let symmetric_patterns = patterns
            .iter()
            .flat_map(|pattern| pattern.symmetries())
            .collect();
        let weights = patterns.iter().map(|_| WeightTable::new()).collect();
        NTupleAgent {
            patterns,
            symmetric_patterns,
            weights,
            learning_rate: 0.01,
            discount_factor: 0.99,
            init_value: 0.0,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    /// Optimistic initial value for unseen features. Large values drive
    /// early exploration.
    pub fn with_init_value(mut self, init_value: f64) -> Self {
        self.init_value = init_value;
        self
    }

    /// Sum of the weights of every symmetric pattern's feature on `board`.
    pub fn value(&self, board: &Board) -> f64 {
        self.symmetric_patterns
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                let key = feature(board, pattern);
                self.weights[index / 8]
                    .get(&key)
                    .copied()
                    .unwrap_or(self.init_value)
            })
            .sum()
    }

    fn update_weights(&mut self, board: &Board, delta: f64) {
        let step = self.learning_rate * delta;
        for (index, pattern) in self.symmetric_patterns.iter().enumerate() {
            let key = feature(board, pattern);
            self.weights[index / 8]
                .entry(key)
                .and_modify(|weight| *weight += step)
                .or_insert(self.init_value + step);
        }
    }

    /// One TD(0) update on an afterstate transition.
    pub fn learn(&mut self, experience: &Experience) {
        let next_value = if experience.done {
            0.0
        } else {
            self.discount_factor * self.value(&experience.afterstate)
        };
        let target = experience.reward as f64 + next_value;
        let delta = target - self.value(&experience.beforestate);
        self.update_weights(&experience.beforestate, delta);
    }

    /// Immediate merge reward plus discounted afterstate value of playing
    /// `mv` on `board`. The move must be legal.
    pub fn action_value(&self, board: &Board, mv: Move) -> f64 {
        let mut afterstate = *board;
        let reward = afterstate.slide(mv).unwrap_or(0);
        reward as f64 + self.discount_factor * self.value(&afterstate)
    }

    /// ε-greedy action choice. Returns `None` iff no move is legal. Greedy
    /// ties go to the lowest action index.
    pub fn choose_action<R: Rng>(&self, env: &Env, epsilon: f64, rng: &mut R) -> Option<Move> {
        let legal = env.legal_moves();
        if legal.is_empty() {
            return None;
        }
        if rng.gen::<f64>() < epsilon {
            return Some(legal[rng.gen_range(0..legal.len())]);
        }
        let mut best = legal[0];
        let mut best_value = f64::NEG_INFINITY;
        for &mv in &legal {
            let value = self.action_value(env.board(), mv);
            if value > best_value {
                best = mv;
                best_value = value;
            }
        }
        Some(best)
    }

    /// Run `episodes` games of ε-greedy self-play, replaying each trajectory
    /// in reverse for the TD updates. Returns the final score of every
    /// episode.
    pub fn train<R: Rng>(
        &mut self,
        env: &mut Env,
        episodes: u64,
        schedule: EpsilonSchedule,
        rng: &mut R,
    ) -> Vec<u32> {
        const REPORT_INTERVAL: usize = 100;

        let mut scores = Vec::with_capacity(episodes as usize);
        for episode in 0..episodes {
            let epsilon = schedule.value_at(episode);
            let mut trajectory: Vec<Experience> = vec![];
            // The chain runs over afterstates: each step's beforestate is
            // the previous afterstate, starting from the empty board.
            let mut beforestate = Board::default();
            let mut done = false;

            env.reset();
            while !done {
                let Some(action) = self.choose_action(env, epsilon, rng) else {
                    break;
                };
                let score_before = env.score();
                env.slide(action);
                let afterstate = *env.board();
                let reward = env.score() - score_before;
                env.add_random_tile();
                done = env.is_game_over();

                trajectory.push(Experience {
                    beforestate,
                    action,
                    reward,
                    afterstate,
                    done,
                });
                beforestate = afterstate;
            }

            for experience in trajectory.iter().rev() {
                self.learn(experience);
            }
            scores.push(env.score());

            if episode % REPORT_INTERVAL as u64 == 0 {
                let window = &scores[scores.len().saturating_sub(REPORT_INTERVAL)..];
                let average = window.iter().sum::<u32>() as f64 / window.len() as f64;
                info!(
                    "episode {}: average score {:.1} (ε = {:.3})",
                    episode, average, epsilon
                );
            }
        }
        scores
    }

    pub fn save_weights(&self, path: &Path) -> io::Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        self.write_weights(&mut writer)
    }

    pub fn load_weights(&mut self, path: &Path) -> io::Result<()> {
        let file = fs::File::open(path)?;
        self.read_weights(&mut io::BufReader::new(file))
    }

    /// Write every weight table in the text format: a `Pattern <i>:` header
    /// per base pattern, then one `k₀ k₁ … ; w` line per entry.
    pub fn write_weights(&self, writer: &mut impl Write) -> io::Result<()> {
        for (index, table) in self.weights.iter().enumerate() {
            writeln!(writer, "Pattern {}:", index)?;
            for (key, weight) in table {
                for k in key {
                    write!(writer, "{} ", k)?;
                }
                writeln!(writer, "; {}", weight)?;
            }
        }
        Ok(())
    }

    /// Read weight tables written by [`write_weights`]. Blank lines and
    /// `#` comments are ignored; unknown pattern indices and malformed
    /// entries are skipped with a warning.
    ///
    /// [`write_weights`]: NTupleAgent::write_weights
    pub fn read_weights(&mut self, reader: &mut impl BufRead) -> io::Result<()> {
        self.weights = self.patterns.iter().map(|_| WeightTable::new()).collect();

        let mut current_table: Option<usize> = None;
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("Pattern") {
                let index = rest.trim_end_matches(':').trim().parse::<usize>().ok();
                current_table = match index {
                    Some(i) if i < self.patterns.len() => Some(i),
                    _ => {
                        warn!("skipping unknown pattern header {:?}", line);
                        None
                    }
                };
                continue;
            }
            let Some(table_index) = current_table else {
                continue;
            };
            match parse_entry(line) {
                Some((key, weight)) => {
                    self.weights[table_index].insert(key, weight);
                }
                None => warn!("skipping malformed weight entry {:?}", line),
            }
        }
        Ok(())
    }
}

fn parse_entry(line: &str) -> Option<(Feature, f64)> {
    let (key_part, weight_part) = line.split_once(';')?;
    let mut key = Feature::new();
    for word in key_part.split_whitespace() {
        key.try_push(word.parse().ok()?).ok()?;
    }
    let weight = weight_part.trim().parse().ok()?;
    Some((key, weight))
}
