#[cfg(test)]
mod eval_tests;
#[cfg(test)]
mod game_tests;
#[cfg(test)]
mod parallel_tests;

#[cfg(test)]
use crate::game::{Board, Env, SIZE};

/// A board with the given rows and a fresh, seeded environment around it.
#[cfg(test)]
fn env_with_board(rows: [[u32; SIZE]; SIZE]) -> Env {
    let mut env = Env::from_seed(42);
    env.set_board(Board::from_rows(rows));
    env
}

/// A full board with no equal neighbours: the game is over.
#[cfg(test)]
fn dead_board() -> Board {
    Board::from_rows([
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 2],
    ])
}

/// A mid-game board with several legal moves.
#[cfg(test)]
fn midgame_board() -> Board {
    Board::from_rows([
        [4, 32, 8, 2],
        [2, 128, 16, 4],
        [0, 8, 64, 2],
        [0, 2, 4, 2],
    ])
}
