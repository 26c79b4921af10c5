use rand::seq::SliceRandom;
use rand::Rng;

use super::rules::EngineError;
use super::state::{Grid, Power, Tile};

pub const DEFAULT_FOUR_PROBABILITY: f64 = 0.1;

const BASE_POWER: Power = 1;
const BONUS_POWER: Power = 2;

/// 新方块的生成策略。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPolicy {
    four_probability: f64,
}

impl SpawnPolicy {
    pub fn new(four_probability: f64) -> Result<Self, EngineError> {
        if !(0.0..=1.0).contains(&four_probability) {
            return Err(EngineError::InvalidSpawnProbability {
                value: four_probability,
            });
        }
        Ok(Self { four_probability })
    }

    pub fn four_probability(&self) -> f64 {
        self.four_probability
    }

    /// 棋盘已满时返回 `None`。
    pub fn choose<R: Rng + ?Sized>(&self, grid: &Grid, rng: &mut R) -> Option<Tile> {
        let empty = grid.empty_cells();
        let position = *empty.choose(rng)?;
        let power = if rng.gen_bool(self.four_probability) {
            BONUS_POWER
        } else {
            BASE_POWER
        };
        Some(Tile::new(power, position))
    }
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self {
            four_probability: DEFAULT_FOUR_PROBABILITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Position;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn out_of_range_probability_is_rejected() {
        assert!(SpawnPolicy::new(-0.1).is_err());
        assert!(SpawnPolicy::new(1.5).is_err());
        assert!(SpawnPolicy::new(f64::NAN).is_err());
        assert!(SpawnPolicy::new(0.0).is_ok());
        assert!(SpawnPolicy::new(1.0).is_ok());
    }

    #[test]
    fn full_grid_yields_no_tile() {
        let grid = Grid::from_layout(&[vec![Some(1), Some(2)]]).expect("layout should be valid");
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(SpawnPolicy::default().choose(&grid, &mut rng), None);
    }

    #[test]
    fn single_gap_is_always_chosen() {
        let grid = Grid::from_layout(&[vec![Some(1), None, Some(3)]]).expect("layout should be valid");
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            let tile = SpawnPolicy::default()
                .choose(&grid, &mut rng)
                .expect("one cell is empty");
            assert_eq!(tile.position, Position::new(0, 1));
        }
    }

    #[test]
    fn probability_extremes_fix_the_power() {
        let grid = Grid::new(3, 3);
        let mut rng = SmallRng::seed_from_u64(1);

        let always_two = SpawnPolicy::new(1.0).expect("valid probability");
        let never_two = SpawnPolicy::new(0.0).expect("valid probability");
        for _ in 0..20 {
            assert_eq!(always_two.choose(&grid, &mut rng).map(|t| t.power), Some(2));
            assert_eq!(never_two.choose(&grid, &mut rng).map(|t| t.power), Some(1));
        }
    }

    #[test]
    fn same_seed_same_spawns() {
        let grid = Grid::new(4, 4);
        let policy = SpawnPolicy::default();
        let mut first = SmallRng::seed_from_u64(2048);
        let mut second = SmallRng::seed_from_u64(2048);

        for _ in 0..10 {
            assert_eq!(policy.choose(&grid, &mut first), policy.choose(&grid, &mut second));
        }
    }
}
