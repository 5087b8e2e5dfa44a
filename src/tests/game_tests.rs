use crate::game::{compress, merge, Board, Env, Move};
use crate::tests::{dead_board, env_with_board};

#[test]
fn compress_is_idempotent() {
    for row in [
        [0, 2, 0, 2],
        [2, 0, 0, 4],
        [0, 0, 0, 0],
        [2, 4, 8, 16],
        [0, 0, 0, 2],
    ] {
        let once = compress(row);
        assert_eq!(compress(once), once, "row {:?}", row);
    }
}

#[test]
fn merge_scores_the_merged_tiles() {
    let (row, points) = merge([2, 2, 4, 4]);
    assert_eq!(row, [4, 0, 8, 0]);
    assert_eq!(points, 12);
}

#[test]
fn merged_tile_does_not_merge_again() {
    // The leftmost pair becomes a 4; it must not swallow the third 2.
    let (row, points) = merge([2, 2, 2, 0]);
    assert_eq!(row, [4, 0, 2, 0]);
    assert_eq!(points, 4);

    let mut board = Board::from_rows([[4, 4, 8, 0]; 4]);
    assert!(board.slide(Move::Left).is_some());
    assert_eq!(board, Board::from_rows([[8, 8, 0, 0]; 4]));
}

#[test]
fn slide_left_merges_pair() {
    // S1
    let mut env = env_with_board([
        [2, 2, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ]);
    assert!(env.slide(Move::Left));
    assert_eq!(env.board()[(0, 0)], 4);
    assert_eq!(env.board()[(0, 1)], 0);
    assert_eq!(env.score(), 4);
}

#[test]
fn slide_left_merges_leftmost_pair_first() {
    // S2
    let mut env = env_with_board([
        [2, 2, 2, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ]);
    assert!(env.slide(Move::Left));
    assert_eq!(
        *env.board(),
        Board::from_rows([
            [4, 2, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ])
    );
    assert_eq!(env.score(), 4);
}

#[test]
fn slide_up_merges_columns() {
    // S4
    let mut env = env_with_board([
        [2, 2, 0, 0],
        [2, 2, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ]);
    assert!(env.slide(Move::Up));
    assert_eq!(
        *env.board(),
        Board::from_rows([
            [4, 4, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
        ])
    );
    assert_eq!(env.score(), 8);
}

#[test]
fn step_spawns_exactly_one_tile() {
    let mut env = env_with_board([
        [2, 2, 4, 8],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ]);
    let mut merged = *env.board();
    assert!(merged.slide(Move::Left).is_some());
    let after_merge_tiles = 16 - merged.empty_cells().len();

    let result = env.step(Move::Left);
    assert!(env.last_move_valid());
    let tiles = 16 - result.board.empty_cells().len();
    assert_eq!(tiles, after_merge_tiles + 1);

    // The spawned tile is a 2 or a 4 on a cell that was empty after the
    // merge.
    let mut spawned = vec![];
    for (y, x) in merged.empty_cells() {
        if result.board[(y, x)] != 0 {
            spawned.push(result.board[(y, x)]);
        }
    }
    assert_eq!(spawned.len(), 1);
    assert!(spawned[0] == 2 || spawned[0] == 4);
}

#[test]
fn invalid_move_does_not_spawn() {
    let mut env = env_with_board([
        [2, 4, 8, 16],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
        [0, 0, 0, 0],
    ]);
    let before = *env.board();
    let result = env.step(Move::Up);
    assert!(!env.last_move_valid());
    assert_eq!(result.board, before);
    assert_eq!(result.score, 0);
}

#[test]
fn legality_check_is_pure() {
    let boards = [
        [[2, 4, 8, 16], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
        [[2, 2, 0, 0], [4, 4, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
        [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]],
    ];
    for rows in boards {
        let mut env = env_with_board(rows);
        env.set_score(123);
        for mv in Move::ALL {
            env.is_move_legal(mv);
            assert_eq!(*env.board(), Board::from_rows(rows));
            assert_eq!(env.score(), 123);
        }
    }
}

#[test]
fn no_legal_moves_iff_game_over() {
    let mut env = Env::from_seed(3);
    env.reset();
    for _ in 0..10_000 {
        assert_eq!(env.legal_moves().is_empty(), env.is_game_over());
        let legal = env.legal_moves();
        if legal.is_empty() {
            return;
        }
        env.step(legal[0]);
    }
    panic!("game did not end");
}

#[test]
fn full_board_without_neighbours_is_over() {
    // S3
    let env = env_with_board([
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 2],
    ]);
    assert!(env.is_game_over());
    assert!(env.legal_moves().is_empty());
    assert!(dead_board().is_game_over());
}

#[test]
fn reset_spawns_two_tiles() {
    let mut env = Env::from_seed(9);
    let board = env.reset();
    assert_eq!(board.empty_cells().len(), 14);
    assert_eq!(env.score(), 0);
}

#[test]
fn rotations_compose_to_identity() {
    let original = crate::tests::midgame_board();
    let mut board = original;
    board.rotate_90();
    assert_ne!(board, original);
    board.rotate_270();
    assert_eq!(board, original);
    board.rotate_180();
    board.rotate_180();
    assert_eq!(board, original);
}

#[test]
fn move_indices_round_trip() {
    for mv in Move::ALL {
        assert_eq!(Move::from_index(mv.index()), Some(mv));
    }
    assert_eq!(Move::from_index(4), None);
}
