pub mod game;
pub mod utils;

use std::str::FromStr;

use log::LevelFilter;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub use game::{
    BoardEngine, Direction, EngineConfig, EngineError, GameEvent, GameObserver, Grid, Layout,
    LayoutError, MoveOutcome, MoveResolution, Position, Power, SpawnPolicy, Tile,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging(LevelFilter::Info);
}

fn to_js_error(error: EngineError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_direction(direction: &str) -> Result<Direction, JsValue> {
    Direction::from_str(direction).map_err(serde_to_js_error)
}

fn make_resolution_json(resolution: MoveResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

#[wasm_bindgen]
pub struct GameEngine {
    engine: BoardEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json(&json).map_err(to_js_error)?,
            None => EngineConfig::default(),
        };
        let engine = BoardEngine::new(&config).map_err(to_js_error)?;
        Ok(GameEngine { engine })
    }

    pub fn start(&mut self) -> Result<String, JsValue> {
        let events = self.engine.start();
        self.resolution_json(MoveOutcome::idle(self.engine.is_game_over()), events)
    }

    pub fn restart(&mut self) -> Result<String, JsValue> {
        let events = self.engine.restart();
        self.resolution_json(MoveOutcome::idle(self.engine.is_game_over()), events)
    }

    pub fn move_tiles(&mut self, direction: &str) -> Result<String, JsValue> {
        let direction = parse_direction(direction)?;
        let (outcome, events) = self.engine.move_tiles(direction);
        self.resolution_json(outcome, events)
    }

    pub fn can_move(&self, direction: &str) -> Result<bool, JsValue> {
        Ok(self.engine.can_move(parse_direction(direction)?))
    }

    pub fn grid_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.serialized_grid()).map_err(serde_to_js_error)
    }

    /// 载入序列化棋盘，并以放置事件重放全部方块。
    pub fn load_grid_json(&mut self, json: &str) -> Result<String, JsValue> {
        let layout: Layout = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.engine.load_layout(&layout).map_err(to_js_error)?;
        self.start()
    }

    pub fn score(&self) -> f64 {
        self.engine.score() as f64
    }

    pub fn best_score(&self) -> f64 {
        self.engine.best_score() as f64
    }

    pub fn is_game_over(&self) -> bool {
        self.engine.is_game_over()
    }

    fn resolution_json(
        &self,
        outcome: MoveOutcome,
        events: Vec<GameEvent>,
    ) -> Result<String, JsValue> {
        make_resolution_json(MoveResolution::new(&self.engine, outcome, events))
    }
}

/// 对传入的棋盘滑动一次（不生成新方块），返回结果与事件。
#[wasm_bindgen(js_name = "slideGrid")]
pub fn slide_grid(grid: JsValue, direction: &str) -> Result<JsValue, JsValue> {
    let layout: Layout = from_value(grid).map_err(JsValue::from)?;
    let direction = parse_direction(direction)?;
    let config = EngineConfig::default().with_layout(layout).without_spawn();
    let mut engine = BoardEngine::new(&config).map_err(to_js_error)?;
    let (outcome, events) = engine.move_tiles(direction);
    to_value(&MoveResolution::new(&engine, outcome, events)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isTerminal")]
pub fn is_terminal(grid: JsValue) -> Result<bool, JsValue> {
    let grid: Grid = from_value(grid).map_err(JsValue::from)?;
    Ok(grid.is_terminal())
}

#[wasm_bindgen(js_name = "setLogLevel")]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = LevelFilter::from_str(level).map_err(serde_to_js_error)?;
    log::set_max_level(filter);
    Ok(())
}
