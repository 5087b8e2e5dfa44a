use std::io;
use std::path::Path;
use std::time;

use twenty48::eval::{default_patterns, NTupleAgent};
use twenty48::game::{Env, Move};
use twenty48::search::{mcts_action_with_settings, mcts_with_settings, MctsSetting};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const WEIGHTS_PATH: &str = "weights.txt";

fn main() {
    println!("play: Play 2048 yourself");
    println!("watch: Watch the agent play a game with parallel MCTS");
    println!("bench: Compare sequential and parallel search on one position");

    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    match input.trim() {
        "play" => play_human(),
        "watch" => watch_agent(),
        "bench" => bench(),
        s => println!("Unknown option \"{}\"", s),
    }
}

fn load_agent() -> NTupleAgent {
    let mut agent = NTupleAgent::new(default_patterns());
    let path = Path::new(WEIGHTS_PATH);
    match agent.load_weights(path) {
        Ok(()) => println!("Loaded weights from {}", WEIGHTS_PATH),
        Err(error) => println!(
            "Couldn't read {} ({}), starting with empty tables",
            WEIGHTS_PATH, error
        ),
    }
    agent
}

/// Play a game through stdin: w/a/s/d plus enter to move.
fn play_human() {
    let mut env = Env::new();
    env.reset();
    let reader = io::stdin();
    loop {
        println!("{}Score: {}\n", env.board(), env.score());
        if env.is_game_over() {
            println!("Game over! Final score: {}", env.score());
            return;
        }
        println!("Your move (w/a/s/d):");
        let mut input = String::new();
        reader.read_line(&mut input).unwrap();
        let mv = match input.trim() {
            "w" => Move::Up,
            "s" => Move::Down,
            "a" => Move::Left,
            "d" => Move::Right,
            other => {
                println!("\"{}\" is not a move, try again.", other);
                continue;
            }
        };
        if !env.is_move_legal(mv) {
            println!("{} is illegal here, try again.", mv);
            continue;
        }
        env.step(mv);
    }
}

fn watch_agent() {
    let agent = load_agent();
    let settings = MctsSetting::default();
    let mut env = Env::new();
    env.reset();

    let mut total_time = time::Duration::ZERO;
    let mut steps = 0u32;
    loop {
        let start = time::Instant::now();
        let Some(mv) = mcts_action_with_settings(*env.board(), &agent, 500, &settings) else {
            break;
        };
        total_time += start.elapsed();
        steps += 1;
        env.step(mv);
        println!("{}Score: {}\n", env.board(), env.score());
        if env.is_game_over() {
            break;
        }
    }
    println!("Final score: {}", env.score());
    if steps > 0 {
        println!(
            "Average time per move: {:.1} ms over {} moves",
            total_time.as_secs_f64() * 1000.0 / steps as f64,
            steps
        );
    }
}

fn bench() {
    let agent = load_agent();
    let mut env = Env::new();
    env.reset();
    for _ in 0..20 {
        let legal = env.legal_moves();
        if legal.is_empty() {
            break;
        }
        env.step(legal[0]);
    }
    let board = *env.board();
    println!("{}", board);

    let settings = MctsSetting::default().add_seed(1);
    let start = time::Instant::now();
    let sequential = mcts_with_settings(board, &agent, 4096, &settings);
    println!(
        "sequential: {:?} in {:.0} ms",
        sequential,
        start.elapsed().as_secs_f64() * 1000.0
    );

    let start = time::Instant::now();
    let parallel = mcts_action_with_settings(board, &agent, 4096, &settings);
    println!(
        "parallel: {:?} in {:.0} ms",
        parallel,
        start.elapsed().as_secs_f64() * 1000.0
    );
}
