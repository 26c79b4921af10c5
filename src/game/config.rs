use serde::{Deserialize, Serialize};

use super::rules::EngineError;
use super::spawn::{SpawnPolicy, DEFAULT_FOUR_PROBABILITY};
use super::state::{Grid, Layout};

const DEFAULT_ROWS: usize = 4;
const DEFAULT_COLUMNS: usize = 4;
/// 单局棋盘允许的最大格子数。
pub const MAX_CELLS: usize = 1 << 16;

/// 引擎配置。提供 `layout` 时以其尺寸为准，忽略 `rows`/`columns`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub rows: usize,
    pub columns: usize,
    pub four_probability: f64,
    pub spawn_on_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            four_probability: DEFAULT_FOUR_PROBABILITY,
            spawn_on_move: true,
            seed: None,
            layout: None,
        }
    }
}

impl EngineConfig {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_four_probability(mut self, four_probability: f64) -> Self {
        self.four_probability = four_probability;
        self
    }

    /// 关闭移动后的方块生成；空棋盘的 `start` 仍会生成一个方块。
    pub fn without_spawn(mut self) -> Self {
        self.spawn_on_move = false;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.build_grid()?;
        self.spawn_policy()?;
        Ok(())
    }

    pub(crate) fn spawn_policy(&self) -> Result<SpawnPolicy, EngineError> {
        SpawnPolicy::new(self.four_probability)
    }

    pub(crate) fn build_grid(&self) -> Result<Grid, EngineError> {
        if let Some(layout) = &self.layout {
            return Ok(Grid::from_layout(layout)?);
        }
        let cells = self.rows.checked_mul(self.columns).unwrap_or(usize::MAX);
        if cells == 0 || cells > MAX_CELLS {
            return Err(EngineError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(Grid::new(self.rows, self.columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::LayoutError;

    #[test]
    fn defaults_describe_classic_board() {
        let config = EngineConfig::default();
        assert_eq!((config.rows, config.columns), (4, 4));
        assert_eq!(config.four_probability, 0.1);
        assert!(config.spawn_on_move);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = EngineConfig::from_json(r#"{"rows": 5, "seed": 3}"#)
            .expect("config should parse");
        assert_eq!(config.rows, 5);
        assert_eq!(config.columns, 4);
        assert_eq!(config.seed, Some(3));
        assert!(config.layout.is_none());
    }

    #[test]
    fn layout_overrides_dimensions() {
        let config = EngineConfig::new(9, 9).with_layout(vec![vec![Some(1), None, None]]);
        let grid = config.build_grid().expect("layout should be valid");
        assert_eq!((grid.rows(), grid.columns()), (1, 3));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert_eq!(
            EngineConfig::new(0, 4).validate(),
            Err(EngineError::InvalidDimensions {
                rows: 0,
                columns: 4
            })
        );
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        assert_eq!(
            EngineConfig::new(usize::MAX / 2, usize::MAX / 2).validate(),
            Err(EngineError::InvalidDimensions {
                rows: usize::MAX / 2,
                columns: usize::MAX / 2
            })
        );
        assert!(matches!(
            EngineConfig::from_json(r#"{"rows": 4294967295, "columns": 2}"#),
            Err(EngineError::InvalidDimensions { columns: 2, .. })
        ));
        assert!(EngineConfig::new(257, 256).validate().is_err());
        assert!(EngineConfig::new(256, 256).validate().is_ok());
    }

    #[test]
    fn invalid_layout_surfaces_as_layout_error() {
        let config = EngineConfig::default().with_layout(vec![vec![Some(1)], vec![]]);
        assert_eq!(
            config.validate(),
            Err(EngineError::InvalidLayout {
                error: LayoutError::ZeroWidthRow { row: 1 }
            })
        );
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            EngineConfig::from_json("{rows: nope}"),
            Err(EngineError::Serialization { .. })
        ));
    }

    #[test]
    fn probability_is_validated() {
        assert!(EngineConfig::default()
            .with_four_probability(2.0)
            .validate()
            .is_err());
    }
}
