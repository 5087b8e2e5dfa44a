use crate::eval::{default_patterns, NTupleAgent};
use crate::game::Env;
use crate::search::parallel::testing;
use crate::search::{mcts_action, mcts_action_with_settings, MctsSetting};
use crate::tests::{dead_board, env_with_board, midgame_board};

#[test]
fn terminal_root_has_no_action() {
    let agent = NTupleAgent::new(default_patterns());
    assert_eq!(mcts_action(dead_board(), &agent, 500), None);
}

#[test]
fn zero_iterations_give_no_action() {
    // S6: workers may speculate, but nothing is visited authoritatively.
    let agent = NTupleAgent::new(default_patterns());
    assert_eq!(mcts_action(midgame_board(), &agent, 0), None);
}

#[test]
fn parallel_search_returns_a_legal_move() {
    let agent = NTupleAgent::new(default_patterns());
    let env = env_with_board([
        [2, 4, 8, 16],
        [16, 8, 4, 2],
        [2, 4, 8, 16],
        [0, 0, 0, 2],
    ]);
    for threads in [1, 2, 4] {
        let settings = MctsSetting::default().add_threads(threads).add_seed(7);
        let mv = mcts_action_with_settings(*env.board(), &agent, 300, &settings).unwrap();
        assert!(
            env.is_move_legal(mv),
            "{} is not legal with {} workers",
            mv,
            threads
        );
    }
}

#[test]
fn parallel_search_plays_a_full_game() {
    let agent = NTupleAgent::new(default_patterns());
    let settings = MctsSetting::default().add_threads(2).add_rollout_depth(5);
    let mut env = Env::from_seed(13);
    env.reset();
    let mut steps = 0;
    while let Some(mv) = mcts_action_with_settings(*env.board(), &agent, 50, &settings) {
        let result = env.step(mv);
        steps += 1;
        assert!(steps < 10_000);
        if result.game_over {
            break;
        }
    }
    assert!(env.is_game_over());
    assert!(env.score() > 0);
}

#[test]
fn cancelled_task_performs_no_mutation() {
    let agent = NTupleAgent::new(default_patterns());
    let (node, task) = testing::lone_working_node(midgame_board());
    testing::cancel_task(&task);
    testing::run_worker_on(&agent, &task);
    assert_eq!(testing::child_count(&node), 0);
    assert_eq!(testing::buffered_count(&node), 0);
}

#[test]
fn workers_never_touch_authoritative_statistics() {
    let agent = NTupleAgent::new(default_patterns());
    let (node, task) = testing::lone_working_node(midgame_board());
    testing::run_worker_on(&agent, &task);
    // The worker expanded children and buffered hand-offs...
    assert!(testing::child_count(&node) > 0);
    assert!(testing::buffered_count(&node) > 0);
    // ...but the main thread's statistics are untouched.
    assert_eq!(testing::authoritative_visits(&node), 0);
}

#[test]
fn worker_fills_the_reservation_buffer_to_its_target() {
    let agent = NTupleAgent::new(default_patterns());
    let (node, task) = testing::lone_working_node(midgame_board());
    testing::run_worker_on(&agent, &task);
    // A decision node's buffer target is its number of legal actions, and
    // every buffered leaf must be accounted a child subtree.
    let buffered = testing::buffered_count(&node);
    assert!(buffered <= 4);
    assert_eq!(buffered, testing::child_count(&node));
}
