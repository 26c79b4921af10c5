//! 游戏核心逻辑模块（棋盘状态、滑动合并规则、方块生成与配置）。

pub mod config;
pub mod rules;
pub mod spawn;
pub mod state;

pub use config::EngineConfig;
pub use rules::{BoardEngine, EngineError, GameObserver, MoveOutcome, MoveResolution};
pub use spawn::{SpawnPolicy, DEFAULT_FOUR_PROBABILITY};
pub use state::{
    Direction,
    GameEvent,
    Grid,
    Layout,
    LayoutError,
    ParseDirectionError,
    Position,
    Power,
    Tile,
    MAX_POWER,
};
