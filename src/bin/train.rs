use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use twenty48::eval::{default_patterns, EpsilonSchedule, NTupleAgent};
use twenty48::game::Env;

/// Train and evaluate the N-tuple TD agent.
#[derive(Parser)]
struct Cli {
    /// Weights file to load from and save to.
    #[arg(long, default_value = "weights.txt", env = "TWENTY48_WEIGHTS")]
    weights: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run TD training episodes, saving weights periodically.
    Train {
        #[arg(long, default_value_t = 100_000)]
        episodes: u64,
        /// Episodes between checkpoint saves.
        #[arg(long, default_value_t = 1000)]
        save_interval: u64,
        #[arg(long, default_value_t = 0.1)]
        epsilon_start: f64,
        #[arg(long, default_value_t = 0.1)]
        epsilon_end: f64,
        #[arg(long, default_value_t = 10_000)]
        decay_episodes: u64,
        #[arg(long, default_value_t = 0.01)]
        learning_rate: f64,
        /// Optimistic initial value for unseen features.
        #[arg(long, default_value_t = 160_000.0)]
        init_value: f64,
    },
    /// Play greedy evaluation episodes and report score statistics.
    Eval {
        #[arg(long, default_value_t = 1000)]
        episodes: u64,
    },
}

fn init_logger() {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .apply()
        .unwrap();
}

fn main() {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            episodes,
            save_interval,
            epsilon_start,
            epsilon_end,
            decay_episodes,
            learning_rate,
            init_value,
        } => {
            let mut agent = NTupleAgent::new(default_patterns())
                .with_learning_rate(learning_rate)
                .with_discount(1.0)
                .with_init_value(init_value);
            if let Err(error) = agent.load_weights(&cli.weights) {
                warn!(
                    "couldn't read {} ({}), training from scratch",
                    cli.weights.display(),
                    error
                );
            }

            let schedule = EpsilonSchedule {
                start: epsilon_start,
                end: epsilon_end,
                decay_episodes,
            };
            let mut env = Env::new();
            let mut rng = SmallRng::from_entropy();
            let mut trained = 0;
            while trained < episodes {
                let chunk = save_interval.min(episodes - trained);
                agent.train(&mut env, chunk, schedule, &mut rng);
                trained += chunk;
                agent.save_weights(&cli.weights).unwrap_or_else(|error| {
                    warn!("couldn't save weights: {}", error);
                });
                info!("saved weights after {} episodes", trained);
            }
        }
        Command::Eval { episodes } => {
            let mut agent = NTupleAgent::new(default_patterns());
            if let Err(error) = agent.load_weights(&cli.weights) {
                warn!(
                    "couldn't read {} ({}), evaluating empty tables",
                    cli.weights.display(),
                    error
                );
            }

            let scores: Vec<u32> = (0..episodes)
                .into_par_iter()
                .map(|episode| {
                    let mut env = Env::new();
                    let mut rng = SmallRng::seed_from_u64(episode);
                    env.reset();
                    while let Some(action) = agent.choose_action(&env, 0.0, &mut rng) {
                        if env.step(action).game_over {
                            break;
                        }
                    }
                    env.score()
                })
                .collect();

            let average = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
            println!("Eval episodes: {}", scores.len());
            println!("Average score: {:.1}", average);
            println!("Min score:     {}", scores.iter().min().unwrap());
            println!("Max score:     {}", scores.iter().max().unwrap());
        }
    }
}
