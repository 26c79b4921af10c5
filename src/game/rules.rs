use log::{debug, info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    config::EngineConfig,
    spawn::SpawnPolicy,
    state::{Direction, GameEvent, Grid, Layout, LayoutError, Position, Tile, MAX_POWER},
};

#[derive(Debug, Clone, Serialize, PartialEq, Error)]
#[serde(tag = "type")]
pub enum EngineError {
    #[error("invalid layout: {error}")]
    InvalidLayout {
        #[source]
        error: LayoutError,
    },
    #[error("unsupported grid dimensions {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    #[error("spawn probability must lie in [0, 1], got {value}")]
    InvalidSpawnProbability { value: f64 },
    #[error("malformed input: {message}")]
    Serialization { message: String },
}

impl From<LayoutError> for EngineError {
    fn from(error: LayoutError) -> Self {
        EngineError::InvalidLayout { error }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Serialization {
            message: error.to_string(),
        }
    }
}

pub trait GameObserver {
    fn tile_moved(&mut self, _from: Position, _to: Position) {}

    fn tile_merged(&mut self, _from: Position, _into: Position, _tile: Tile) {}

    fn tile_spawned(&mut self, _at: Position, _tile: Tile) {}

    fn tile_placed(&mut self, _at: Position, _tile: Tile) {}

    fn score_changed(&mut self, _score: u64) {}

    fn game_over(&mut self) {}
}

impl GameObserver for () {}

impl GameObserver for Vec<GameEvent> {
    fn tile_moved(&mut self, from: Position, to: Position) {
        self.push(GameEvent::TileMoved { from, to });
    }

    fn tile_merged(&mut self, from: Position, into: Position, tile: Tile) {
        self.push(GameEvent::TileMerged { from, into, tile });
    }

    fn tile_spawned(&mut self, at: Position, tile: Tile) {
        self.push(GameEvent::TileSpawned { at, tile });
    }

    fn tile_placed(&mut self, at: Position, tile: Tile) {
        self.push(GameEvent::TilePlaced { at, tile });
    }

    fn score_changed(&mut self, score: u64) {
        self.push(GameEvent::ScoreChanged { score });
    }

    fn game_over(&mut self) {
        self.push(GameEvent::GameOver);
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub score_delta: u64,
    pub game_over: bool,
}

impl MoveOutcome {
    pub fn idle(game_over: bool) -> Self {
        Self {
            moved: false,
            score_delta: 0,
            game_over,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResolution {
    pub grid: Layout,
    pub score: u64,
    pub best_score: u64,
    pub outcome: MoveOutcome,
    pub events: Vec<GameEvent>,
}

impl MoveResolution {
    pub fn new<R>(engine: &BoardEngine<R>, outcome: MoveOutcome, events: Vec<GameEvent>) -> Self {
        Self {
            grid: engine.serialized_grid(),
            score: engine.score(),
            best_score: engine.best_score(),
            outcome,
            events,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sweep {
    pub changed: bool,
    pub gained: u64,
}

fn sweep_order(rows: usize, columns: usize, direction: Direction) -> Vec<Position> {
    let (lines, span) = if direction.is_horizontal() {
        (rows, columns)
    } else {
        (columns, rows)
    };

    let mut order = Vec::with_capacity(rows * columns);
    for line in 0..lines {
        for step in 0..span {
            let offset = if direction.towards_high_index() {
                span - 1 - step
            } else {
                step
            };
            order.push(if direction.is_horizontal() {
                Position::new(line, offset)
            } else {
                Position::new(offset, line)
            });
        }
    }
    order
}

pub(crate) fn sweep(
    grid: &mut Grid,
    direction: Direction,
    observer: &mut dyn GameObserver,
) -> Sweep {
    let mut result = Sweep::default();

    for origin in sweep_order(grid.rows(), grid.columns(), direction) {
        let Some(tile) = grid.take(origin) else {
            continue;
        };

        let mut target = origin;
        while let Some(next) = grid.neighbor(target, direction) {
            if grid.get(next).is_some() {
                break;
            }
            target = next;
        }

        let blocker = grid
            .neighbor(target, direction)
            .and_then(|ahead| grid.get(ahead).copied());
        if let Some(blocker) = blocker {
            if blocker.power == tile.power && !blocker.merged_this_move && tile.power < MAX_POWER
            {
                let merged = Tile {
                    power: tile.power + 1,
                    position: blocker.position,
                    merged_this_move: true,
                };
                grid.put(merged);
                result.changed = true;
                result.gained = result.gained.saturating_add(merged.value());
                observer.tile_merged(origin, merged.position, merged);
                continue;
            }
        }

        grid.put(tile.at(target));
        if target != origin {
            result.changed = true;
            observer.tile_moved(origin, target);
        }
    }

    result
}

#[derive(Debug, Clone)]
pub struct BoardEngine<R = SmallRng> {
    grid: Grid,
    score: u64,
    best_score: u64,
    finished: bool,
    spawn: SpawnPolicy,
    spawn_on_move: bool,
    rng: R,
}

impl BoardEngine<SmallRng> {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn from_layout(layout: Layout) -> Result<Self, EngineError> {
        Self::new(&EngineConfig::default().with_layout(layout))
    }
}

impl<R> BoardEngine<R> {
    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn columns(&self) -> usize {
        self.grid.columns()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn tile(&self, position: Position) -> Option<&Tile> {
        self.grid.get(position)
    }

    pub fn empty_cells(&self) -> Vec<Position> {
        self.grid.empty_cells()
    }

    pub fn max_tile_value(&self) -> Option<u64> {
        self.grid.max_tile_value()
    }

    pub fn serialized_grid(&self) -> Layout {
        self.grid.to_layout()
    }

    pub fn is_game_over(&self) -> bool {
        self.grid.is_terminal()
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        let mut scratch = self.grid.clone();
        sweep(&mut scratch, direction, &mut ()).changed
    }
}

impl<R: Rng> BoardEngine<R> {
    pub fn with_rng(config: &EngineConfig, rng: R) -> Result<Self, EngineError> {
        let grid = config.build_grid()?;
        let spawn = config.spawn_policy()?;
        Ok(Self {
            grid,
            score: 0,
            best_score: 0,
            finished: false,
            spawn,
            spawn_on_move: config.spawn_on_move,
            rng,
        })
    }

    pub fn start_with(&mut self, observer: &mut dyn GameObserver) {
        if self.grid.is_empty() {
            self.spawn_tile(observer);
            info!(
                "new {}x{} game started",
                self.grid.rows(),
                self.grid.columns()
            );
        } else {
            for tile in self.grid.tiles() {
                observer.tile_placed(tile.position, *tile);
            }
            info!(
                "resumed {}x{} game with {} tiles",
                self.grid.rows(),
                self.grid.columns(),
                self.grid.tiles().count()
            );
        }

        if self.grid.is_terminal() && !self.finished {
            self.finished = true;
            info!("loaded board is already over");
            observer.game_over();
        }
    }

    pub fn start(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.start_with(&mut events);
        events
    }

    pub fn restart_with(&mut self, observer: &mut dyn GameObserver) {
        self.grid = Grid::new(self.grid.rows(), self.grid.columns());
        self.score = 0;
        self.finished = false;
        self.start_with(observer);
    }

    pub fn restart(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.restart_with(&mut events);
        events
    }

    pub fn load_layout(&mut self, layout: &Layout) -> Result<(), EngineError> {
        self.grid = Grid::from_layout(layout)?;
        self.score = 0;
        self.finished = false;
        Ok(())
    }

    pub fn move_with(
        &mut self,
        direction: Direction,
        observer: &mut dyn GameObserver,
    ) -> MoveOutcome {
        if self.finished {
            return MoveOutcome::idle(true);
        }

        let swept = sweep(&mut self.grid, direction, observer);
        if !swept.changed {
            return MoveOutcome::idle(self.grid.is_terminal());
        }

        self.grid.clear_merge_flags();
        if self.spawn_on_move {
            self.spawn_tile(observer);
        }

        if swept.gained > 0 {
            self.score = self.score.saturating_add(swept.gained);
            self.best_score = self.best_score.max(self.score);
            observer.score_changed(self.score);
        }
        debug!(
            "moved {direction}: +{} points, score {}",
            swept.gained, self.score
        );
        trace!("board after {direction}:\n{}", self.grid);

        let game_over = self.grid.is_terminal();
        if game_over {
            self.finished = true;
            info!("game over with score {}", self.score);
            observer.game_over();
        }

        MoveOutcome {
            moved: true,
            score_delta: swept.gained,
            game_over,
        }
    }

    pub fn move_tiles(&mut self, direction: Direction) -> (MoveOutcome, Vec<GameEvent>) {
        let mut events = Vec::new();
        let outcome = self.move_with(direction, &mut events);
        (outcome, events)
    }

    fn spawn_tile(&mut self, observer: &mut dyn GameObserver) {
        let Some(tile) = self.spawn.choose(&self.grid, &mut self.rng) else {
            return;
        };
        trace!("spawned power {} at {}", tile.power, tile.position);
        self.grid.put(tile);
        observer.tile_spawned(tile.position, tile);
    }
}
