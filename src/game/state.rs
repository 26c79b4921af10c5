use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 方块的指数，显示数值为 `2^power`。
pub type Power = u8;
/// 按行序列化的棋盘，空格为 `None`。
pub type Layout = Vec<Vec<Option<Power>>>;

/// 方块允许的最大指数，数值仍可放入 `u64`。
pub const MAX_POWER: Power = 63;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// 棋盘上的数字方块。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tile {
    pub power: Power,
    pub position: Position,
    #[serde(default, skip_serializing)]
    pub merged_this_move: bool,
}

impl Tile {
    pub fn new(power: Power, position: Position) -> Self {
        Self {
            power,
            position,
            merged_this_move: false,
        }
    }

    pub fn value(&self) -> u64 {
        1u64.checked_shl(u32::from(self.power)).unwrap_or(u64::MAX)
    }

    pub(crate) fn at(self, position: Position) -> Self {
        Self { position, ..self }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// 是否朝行或列下标增大的方向移动。
    pub fn towards_high_index(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "arrowleft" | "l" => Ok(Direction::Left),
            "up" | "arrowup" | "u" => Ok(Direction::Up),
            "right" | "arrowright" | "r" => Ok(Direction::Right),
            "down" | "arrowdown" | "d" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

/// 棋盘事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    TileMoved {
        from: Position,
        to: Position,
    },
    TileMerged {
        from: Position,
        into: Position,
        tile: Tile,
    },
    TileSpawned {
        at: Position,
        tile: Tile,
    },
    TilePlaced {
        at: Position,
        tile: Tile,
    },
    ScoreChanged {
        score: u64,
    },
    GameOver,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has no cells")]
    ZeroWidthRow { row: usize },
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("cell ({row}, {column}) holds power {power}, expected 1..={max}")]
    PowerOutOfRange {
        row: usize,
        column: usize,
        power: Power,
        max: Power,
    },
}

/// 固定尺寸的棋盘，每格最多一个方块。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Layout", into = "Layout")]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Option<Tile>>,
}

impl Grid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
        }
    }

    pub fn from_layout(layout: &[Vec<Option<Power>>]) -> Result<Self, LayoutError> {
        let first = layout.first().ok_or(LayoutError::Empty)?;
        let columns = first.len();

        let mut grid = Grid::new(layout.len(), columns);
        for (row, cells) in layout.iter().enumerate() {
            if cells.is_empty() {
                return Err(LayoutError::ZeroWidthRow { row });
            }
            if cells.len() != columns {
                return Err(LayoutError::Ragged {
                    row,
                    expected: columns,
                    actual: cells.len(),
                });
            }
            for (column, power) in cells.iter().enumerate() {
                let Some(power) = *power else { continue };
                if power == 0 || power > MAX_POWER {
                    return Err(LayoutError::PowerOutOfRange {
                        row,
                        column,
                        power,
                        max: MAX_POWER,
                    });
                }
                grid.put(Tile::new(power, Position::new(row, column)));
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn index(&self, position: Position) -> usize {
        position.row * self.columns + position.column
    }

    pub fn contains(&self, position: Position) -> bool {
        position.row < self.rows && position.column < self.columns
    }

    pub fn get(&self, position: Position) -> Option<&Tile> {
        if !self.contains(position) {
            return None;
        }
        self.cells[self.index(position)].as_ref()
    }

    pub(crate) fn take(&mut self, position: Position) -> Option<Tile> {
        if !self.contains(position) {
            return None;
        }
        let index = self.index(position);
        self.cells[index].take()
    }

    pub(crate) fn put(&mut self, tile: Tile) {
        if self.contains(tile.position) {
            let index = self.index(tile.position);
            self.cells[index] = Some(tile);
        }
    }

    /// 沿 `direction` 的相邻格，越界时返回 `None`。
    pub fn neighbor(&self, position: Position, direction: Direction) -> Option<Position> {
        let (row_step, column_step) = direction.delta();
        let next = Position::new(
            position.row.checked_add_signed(row_step)?,
            position.column.checked_add_signed(column_step)?,
        );
        self.contains(next).then_some(next)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells.iter().flatten()
    }

    pub fn empty_cells(&self) -> Vec<Position> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| Position::new(index / self.columns, index % self.columns))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// 右侧或下方存在可合并的相同方块。
    pub fn has_adjacent_pair(&self) -> bool {
        self.tiles().any(|tile| {
            [Direction::Right, Direction::Down].iter().any(|&direction| {
                self.neighbor(tile.position, direction)
                    .and_then(|next| self.get(next))
                    .map_or(false, |other| {
                        other.power == tile.power && tile.power < MAX_POWER
                    })
            })
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.is_full() && !self.has_adjacent_pair()
    }

    pub fn total_value(&self) -> u64 {
        self.tiles()
            .fold(0u64, |sum, tile| sum.saturating_add(tile.value()))
    }

    pub fn max_tile_value(&self) -> Option<u64> {
        self.tiles().map(Tile::value).max()
    }

    pub(crate) fn clear_merge_flags(&mut self) {
        for tile in self.cells.iter_mut().flatten() {
            tile.merged_this_move = false;
        }
    }

    pub fn to_layout(&self) -> Layout {
        if self.columns == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.columns)
            .map(|row| row.iter().map(|cell| cell.map(|tile| tile.power)).collect())
            .collect()
    }
}

impl TryFrom<Layout> for Grid {
    type Error = LayoutError;

    fn try_from(layout: Layout) -> Result<Self, Self::Error> {
        Grid::from_layout(&layout)
    }
}

impl From<Grid> for Layout {
    fn from(grid: Grid) -> Self {
        grid.to_layout()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line: Vec<String> = (0..self.columns)
                .map(|column| match self.get(Position::new(row, column)) {
                    Some(tile) => tile.value().to_string(),
                    None => ".".to_string(),
                })
                .collect();
            writeln!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}
