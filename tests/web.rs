//! Exercises the JavaScript surface; run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use wasm_2048::{is_terminal, slide_grid, GameEngine, MoveResolution};

wasm_bindgen_test_configure!(run_in_browser);

fn parse(json: &str) -> MoveResolution {
    serde_json::from_str(json).expect("resolution json should parse")
}

#[wasm_bindgen_test]
fn new_game_spawns_one_tile() {
    let mut engine = GameEngine::new(Some(r#"{"seed": 7}"#.into())).expect("valid config");
    let resolution = parse(&engine.start().expect("start succeeds"));

    assert_eq!(resolution.events.len(), 1);
    assert_eq!(resolution.score, 0);
    let occupied = resolution.grid.iter().flatten().filter(|cell| cell.is_some()).count();
    assert_eq!(occupied, 1);
}

#[wasm_bindgen_test]
fn move_reports_merge_and_score() {
    let config = r#"{"layout": [[1, 1, null, null]], "spawn_on_move": false}"#;
    let mut engine = GameEngine::new(Some(config.into())).expect("valid config");
    engine.start().expect("start succeeds");

    let resolution = parse(&engine.move_tiles("ArrowLeft").expect("move succeeds"));
    assert_eq!(resolution.grid, vec![vec![Some(2), None, None, None]]);
    assert_eq!(resolution.outcome.score_delta, 4);
    assert_eq!(engine.score(), 4.0);
    assert_eq!(engine.best_score(), 4.0);
}

#[wasm_bindgen_test]
fn unknown_direction_is_rejected() {
    let mut engine = GameEngine::new(None).expect("default config");
    assert!(engine.move_tiles("diagonal").is_err());
    assert!(engine.can_move("sideways").is_err());
}

#[wasm_bindgen_test]
fn ragged_layout_is_rejected_with_structured_error() {
    let config = r#"{"layout": [[1, null], [null]]}"#;
    let error = GameEngine::new(Some(config.into())).err().expect("layout is ragged");
    let error: Value = serde_wasm_bindgen::from_value(error).expect("error is an object");
    assert_eq!(error["type"], "InvalidLayout");
    assert_eq!(error["error"]["type"], "Ragged");
}

#[wasm_bindgen_test]
fn load_grid_replays_placed_tiles() {
    let mut engine = GameEngine::new(None).expect("default config");
    let resolution = parse(
        &engine
            .load_grid_json("[[3, null], [null, 1]]")
            .expect("grid loads"),
    );

    assert_eq!(resolution.events.len(), 2);
    assert_eq!(engine.grid_json().expect("grid serializes"), "[[3,null],[null,1]]");
}

#[wasm_bindgen_test]
fn slide_grid_does_not_spawn() {
    let grid = serde_wasm_bindgen::to_value(&vec![vec![Some(1u8), Some(1), Some(1), None]])
        .expect("grid converts");
    let resolution: MoveResolution = serde_wasm_bindgen::from_value(
        slide_grid(grid, "left").expect("slide succeeds"),
    )
    .expect("resolution converts");

    assert_eq!(resolution.grid, vec![vec![Some(2), Some(1), None, None]]);
}

#[wasm_bindgen_test]
fn terminal_check_on_plain_grid() {
    let full: JsValue = serde_wasm_bindgen::to_value(&vec![
        vec![Some(1u8), Some(2)],
        vec![Some(2), Some(1)],
    ])
    .expect("grid converts");
    assert_eq!(is_terminal(full).ok(), Some(true));

    let open: JsValue =
        serde_wasm_bindgen::to_value(&vec![vec![Some(1u8), None]]).expect("grid converts");
    assert_eq!(is_terminal(open).ok(), Some(false));
}
