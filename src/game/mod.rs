//! The 2048 playing field: board primitives, moves, and the environment
//! wrapper used by training and search.

use std::fmt;
use std::ops::Index;

use arrayvec::ArrayVec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Side length of the board.
pub const SIZE: usize = 4;

type Row = [u32; SIZE];

/// A 4×4 grid of tiles. `0` is an empty cell, any other value is a power of
/// two. Cheap to copy, compared cell-wise.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Board {
    rows: [Row; SIZE],
}

/// One of the four sliding moves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// The conventional integer encoding: 0=Up, 1=Down, 2=Left, 3=Right.
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Move> {
        Move::ALL.get(index).copied()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Move::Up => write!(f, "up"),
            Move::Down => write!(f, "down"),
            Move::Left => write!(f, "left"),
            Move::Right => write!(f, "right"),
        }
    }
}

/// Slide all non-zero tiles to the front of the row, keeping their order.
pub(crate) fn compress(row: Row) -> Row {
    let mut new_row = [0; SIZE];
    let mut i = 0;
    for tile in row {
        if tile != 0 {
            new_row[i] = tile;
            i += 1;
        }
    }
    new_row
}

/// One left-to-right merge pass. The cell merged away is zeroed in place,
/// so a tile never takes part in two merges in the same move. Returns the
/// row and the points scored.
pub(crate) fn merge(row: Row) -> (Row, u32) {
    let mut new_row = row;
    let mut points = 0;
    for i in 0..SIZE - 1 {
        if new_row[i] != 0 && new_row[i] == new_row[i + 1] {
            new_row[i] *= 2;
            points += new_row[i];
            new_row[i + 1] = 0;
        }
    }
    (new_row, points)
}

impl Board {
    pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Self {
        Board { rows }
    }

    pub fn get(&self, y: usize, x: usize) -> u32 {
        self.rows[y][x]
    }

    pub fn set(&mut self, y: usize, x: usize, tile: u32) {
        self.rows[y][x] = tile;
    }

    pub fn empty_cells(&self) -> ArrayVec<(usize, usize), { SIZE * SIZE }> {
        let mut cells = ArrayVec::new();
        for y in 0..SIZE {
            for x in 0..SIZE {
                if self.rows[y][x] == 0 {
                    cells.push((y, x));
                }
            }
        }
        cells
    }

    /// True iff no cell is empty and no two orthogonal neighbours are equal.
    pub fn is_game_over(&self) -> bool {
        for y in 0..SIZE {
            for x in 0..SIZE {
                if self.rows[y][x] == 0 {
                    return false;
                }
                if y < SIZE - 1 && self.rows[y][x] == self.rows[y + 1][x] {
                    return false;
                }
                if x < SIZE - 1 && self.rows[y][x] == self.rows[y][x + 1] {
                    return false;
                }
            }
        }
        true
    }

    /// Apply one sliding move. Returns the points scored by merges, or `None`
    /// if the move changed nothing (i.e. it was illegal).
    pub fn slide(&mut self, mv: Move) -> Option<u32> {
        match mv {
            Move::Left => self.slide_left(),
            Move::Right => {
                self.rotate_180();
                let result = self.slide_left();
                self.rotate_180();
                result
            }
            Move::Up => {
                self.rotate_90();
                let result = self.slide_left();
                self.rotate_270();
                result
            }
            Move::Down => {
                self.rotate_270();
                let result = self.slide_left();
                self.rotate_90();
                result
            }
        }
    }

    fn slide_left(&mut self) -> Option<u32> {
        let mut moved = false;
        let mut points = 0;
        for row in self.rows.iter_mut() {
            let (merged, row_points) = merge(compress(*row));
            let new_row = compress(merged);
            if new_row != *row {
                moved = true;
                *row = new_row;
            }
            points += row_points;
        }
        if moved {
            Some(points)
        } else {
            None
        }
    }

    /// Rotate the board in place, mapping `(y, x)` to `(SIZE-1-x, y)`.
    pub fn rotate_90(&mut self) {
        let mut rotated = [[0; SIZE]; SIZE];
        for y in 0..SIZE {
            for x in 0..SIZE {
                rotated[SIZE - 1 - x][y] = self.rows[y][x];
            }
        }
        self.rows = rotated;
    }

    pub fn rotate_180(&mut self) {
        self.rotate_90();
        self.rotate_90();
    }

    pub fn rotate_270(&mut self) {
        self.rotate_90();
        self.rotate_90();
        self.rotate_90();
    }
}

impl Index<(usize, usize)> for Board {
    type Output = u32;

    fn index(&self, (y, x): (usize, usize)) -> &u32 {
        &self.rows[y][x]
    }
}

fn tile_rgb(tile: u32) -> (u8, u8, u8) {
    match tile {
        0 => (128, 128, 128),
        2 => (238, 228, 218),
        4 => (237, 224, 200),
        8 => (242, 177, 121),
        16 => (245, 149, 99),
        32 => (246, 124, 95),
        64 => (246, 94, 59),
        128 => (237, 207, 114),
        256 => (237, 204, 97),
        512 => (237, 200, 80),
        1024 => (237, 197, 63),
        2048 => (237, 194, 46),
        _ => (60, 60, 60),
    }
}

/// Renders the board with true-color ANSI escapes, one row per line.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.rows.iter() {
            for &tile in row.iter() {
                let (r, g, b) = tile_rgb(tile);
                write!(f, "\x1b[1;38;2;{};{};{}m{}\t", r, g, b, tile)?;
            }
            writeln!(f)?;
        }
        write!(f, "\x1b[0m")
    }
}

/// The result of one environment step. `board` is the position after the
/// random tile spawn, i.e. the new authoritative board.
#[derive(Clone, Copy, Debug)]
pub struct StepResult {
    pub board: Board,
    pub score: u32,
    pub game_over: bool,
}

/// A 2048 game in progress: board, cumulative score, and the outcome of the
/// most recent move. Owns its own RNG so that searches and workers can run
/// deterministic, independent streams of tile spawns.
pub struct Env {
    board: Board,
    score: u32,
    last_move_valid: bool,
    rng: SmallRng,
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Env {
            board: Board::default(),
            score: 0,
            last_move_valid: true,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Env {
            board: Board::default(),
            score: 0,
            last_move_valid: true,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Clear the board and score, then spawn the two starting tiles.
    pub fn reset(&mut self) -> Board {
        self.board = Board::default();
        self.score = 0;
        self.last_move_valid = true;
        self.add_random_tile();
        self.add_random_tile();
        self.board
    }

    /// Apply a move; if it changed the board, spawn a random tile.
    pub fn step(&mut self, mv: Move) -> StepResult {
        let moved = self.slide(mv);
        self.last_move_valid = moved;
        if moved {
            self.add_random_tile();
        }
        StepResult {
            board: self.board,
            score: self.score,
            game_over: self.is_game_over(),
        }
    }

    /// The deterministic half of a step: apply the move and book the score,
    /// without spawning a tile. Returns whether the board changed.
    pub fn slide(&mut self, mv: Move) -> bool {
        match self.board.slide(mv) {
            Some(points) => {
                self.score += points;
                true
            }
            None => false,
        }
    }

    /// Put a 2 (or, with probability 1/10, a 4) on a uniformly random empty
    /// cell. Does nothing on a full board.
    pub fn add_random_tile(&mut self) {
        let empty = self.board.empty_cells();
        if empty.is_empty() {
            return;
        }
        let (y, x) = empty[self.rng.gen_range(0..empty.len())];
        let tile = if self.rng.gen_range(0..10) == 0 { 4 } else { 2 };
        self.board.set(y, x, tile);
    }

    /// Whether the move would change the board. Simulated on a copy, so the
    /// environment is never mutated by the check.
    pub fn is_move_legal(&self, mv: Move) -> bool {
        let mut scratch = self.board;
        scratch.slide(mv).is_some()
    }

    pub fn legal_moves(&self) -> ArrayVec<Move, 4> {
        Move::ALL
            .iter()
            .copied()
            .filter(|&mv| self.is_move_legal(mv))
            .collect()
    }

    pub fn is_game_over(&self) -> bool {
        self.board.is_game_over()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    pub fn last_move_valid(&self) -> bool {
        self.last_move_valid
    }
}
